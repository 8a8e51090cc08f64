//! Directory-backed blob store.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use vellum_core::{paths, Config};

use crate::error::{io_err, BlobError};
use crate::naming::{is_safe_name, resolve_content_type, sanitize_filename, split_extension};

/// Upper bound on names tried for one upload (the bare name plus suffixes).
pub const MAX_NAME_ATTEMPTS: usize = 100;

/// A listed blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobEntry {
    pub name: String,
    pub url: String,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBlob {
    pub name: String,
    pub url: String,
}

/// Blob bytes plus the content type to serve them with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
    public_base: String,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        let public_base = public_base.into();
        Self {
            dir: dir.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(paths::resolve_blob_directory(config), config.image_base.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn public_base(&self) -> &str {
        &self.public_base
    }

    pub fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.public_base, name)
    }

    /// Regular files in the store, sorted by name.
    ///
    /// A directory that is absent and cannot be created lists as empty.
    pub fn list(&self) -> Result<Vec<BlobEntry>, BlobError> {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::debug!("cannot create {}: {e}", self.dir.display());
        }
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.dir, e)),
        };
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            out.push(BlobEntry {
                url: self.public_url(&name),
                name,
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Names of all stored blobs.
    pub fn names(&self) -> Result<Vec<String>, BlobError> {
        Ok(self.list()?.into_iter().map(|e| e.name).collect())
    }

    /// Persist `bytes` under a sanitized, collision-free version of
    /// `suggested`.
    ///
    /// Each candidate is created exclusively, so two concurrent uploads of
    /// the same name cannot clobber each other. Candidates run
    /// `name.ext`, `name-1.ext`, `name-2.ext`, ...
    pub fn store(
        &self,
        bytes: &[u8],
        suggested: &str,
        declared_mime: Option<&str>,
    ) -> Result<StoredBlob, BlobError> {
        if let Some(mime) = declared_mime {
            if !mime.trim().to_ascii_lowercase().starts_with("image/") {
                return Err(BlobError::InvalidMediaType {
                    mime: mime.to_string(),
                });
            }
        }

        let sanitized = sanitize_filename(suggested);
        let (stem, ext) = split_extension(&sanitized);
        let ext = ext.unwrap_or_default();
        fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{stem}{ext}")
            } else {
                format!("{stem}-{attempt}{ext}")
            };
            let target = self.dir.join(&name);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(f) => f,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(io_err(&target, e)),
            };
            if let Err(e) = file.write_all(bytes) {
                drop(file);
                let _ = fs::remove_file(&target);
                return Err(io_err(&target, e));
            }
            tracing::info!("stored image {} ({} bytes)", target.display(), bytes.len());
            return Ok(StoredBlob {
                url: self.public_url(&name),
                name,
            });
        }

        Err(BlobError::Exhausted {
            name: sanitized,
            attempts: MAX_NAME_ATTEMPTS,
        })
    }

    /// Read a blob by exact name.
    pub fn retrieve(&self, name: &str) -> Result<Blob, BlobError> {
        if !is_safe_name(name) {
            return Err(BlobError::NotFound {
                name: name.to_string(),
            });
        }
        let path = self.dir.join(name);
        if path.is_dir() {
            return Err(BlobError::NotFound {
                name: name.to_string(),
            });
        }
        match fs::read(&path) {
            Ok(bytes) => Ok(Blob {
                bytes,
                content_type: resolve_content_type(name),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BlobError::NotFound {
                    name: name.to_string(),
                })
            }
            Err(e) => Err(io_err(&path, e)),
        }
    }
}
