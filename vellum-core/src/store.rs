//! File-backed document store.
//!
//! # Storage layout
//!
//! ```text
//! <resolved document path>            (pretty-printed JSON, 2-space indent)
//! <resolved document path>.tmp        (transient, only during a write)
//! <resolved document path>.corrupt-*  (development only, see `read`)
//! ```
//!
//! # State machine
//!
//! ```text
//! absent  --initialize / initialize_with_data-->  present
//! present --write-->                              present
//! present --delete-->                             absent
//! ```
//!
//! `read` never changes state in production. In development it may move
//! absent → present by bootstrapping the default document.
//!
//! There is no locking: concurrent read-modify-write cycles can lose updates.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::config::Config;
use crate::error::{io_err, write_err, StoreError};
use crate::paths::ResolvedPaths;
use crate::types::Document;

/// Handle on the single site document.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
    production: bool,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>, production: bool) -> Self {
        Self {
            path: path.into(),
            production,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let resolved = ResolvedPaths::resolve(config);
        Self::new(resolved.document_path, resolved.production)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_production(&self) -> bool {
        self.production
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    /// Load the document.
    ///
    /// Production: a missing file is [`StoreError::NotFound`] and an
    /// unparsable one [`StoreError::Corrupt`]; nothing is written. The volume
    /// is expected to be seeded out of band, and auto-creating here would hide
    /// a missing mount.
    ///
    /// Development: either condition bootstraps the default document. An
    /// unparsable file is copied aside first.
    ///
    /// Valid JSON whose shape the typed document cannot hold is a
    /// [`StoreError::Validation`] in both modes and is never overwritten.
    pub fn read(&self) -> Result<Document, StoreError> {
        match self.load() {
            Ok(doc) => Ok(doc),
            Err(err) if self.production => Err(err),
            Err(StoreError::NotFound { .. }) => {
                tracing::warn!(
                    "document missing at {} (development), initializing default",
                    self.path.display()
                );
                self.bootstrap()
            }
            Err(StoreError::Corrupt { source, .. }) => {
                let backup = self.backup_corrupt()?;
                tracing::warn!(
                    "document at {} is unparsable ({source}); moved to {} and re-initialized (development)",
                    self.path.display(),
                    backup.display()
                );
                self.bootstrap()
            }
            Err(err) => Err(err),
        }
    }

    /// Load without any bootstrap policy.
    pub fn load(&self) -> Result<Document, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(io_err(&self.path, e)),
        };
        let tree: Value = serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Document::from_value(tree).map_err(|err| match err {
            StoreError::Validation(reason) => {
                StoreError::Validation(format!("{}: {reason}", self.path.display()))
            }
            other => other,
        })
    }

    fn bootstrap(&self) -> Result<Document, StoreError> {
        let doc = Document::default();
        self.write(&doc)?;
        Ok(doc)
    }

    fn backup_corrupt(&self) -> Result<PathBuf, StoreError> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let backup = sibling(&self.path, &format!("corrupt-{stamp}"));
        fs::copy(&self.path, &backup).map_err(|e| write_err(&backup, e))?;
        Ok(backup)
    }

    // -----------------------------------------------------------------------
    // Write
    // -----------------------------------------------------------------------

    /// Overwrite the whole document.
    ///
    /// Write flow: serialize → `<file>.tmp` sibling → `rename`. The `.tmp`
    /// lives next to the target so the rename never crosses filesystems.
    pub fn write(&self, doc: &Document) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc)?;
        self.write_raw(&json)?;
        tracing::info!("document written to {}", self.path.display());
        Ok(())
    }

    fn write_raw(&self, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
        }
        let tmp = sibling(&self.path, "tmp");
        fs::write(&tmp, contents).map_err(|e| write_err(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(&self.path, e));
        }
        Ok(())
    }

    /// Read, mutate, write. Returns whatever `f` returns.
    pub fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Document) -> Result<T, StoreError>,
    {
        let mut doc = self.read()?;
        let out = f(&mut doc)?;
        self.write(&doc)?;
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Init
    // -----------------------------------------------------------------------

    /// Write the default document unless one already exists.
    ///
    /// Returns `false` (and touches nothing) when a document is present.
    pub fn initialize(&self) -> Result<bool, StoreError> {
        if self.path.exists() {
            tracing::info!("document already exists at {}", self.path.display());
            return Ok(false);
        }
        self.write(&Document::default())?;
        tracing::info!("document initialized at {}", self.path.display());
        Ok(true)
    }

    /// Write caller-supplied data unless a document already exists.
    ///
    /// Never overwrites. Callers that need to replace an existing document
    /// must [`delete`](Self::delete) it first as a separate step.
    pub fn initialize_with_data(&self, data: Value) -> Result<bool, StoreError> {
        if self.path.exists() {
            tracing::info!("document already exists at {}", self.path.display());
            return Ok(false);
        }
        let doc = Document::from_value(data)?;
        tracing::info!("initializing document with provided data: {}", doc.summary());
        self.write(&doc)?;
        self.verify_written();
        Ok(true)
    }

    /// Re-read the file straight from disk and log what landed there.
    fn verify_written(&self) {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str::<Document>(&contents) {
                Ok(doc) => tracing::info!(
                    "verified {} ({} bytes): {}",
                    self.path.display(),
                    contents.len(),
                    doc.summary()
                ),
                Err(e) => tracing::warn!("could not verify {}: {e}", self.path.display()),
            },
            Err(e) => tracing::warn!("could not verify {}: {e}", self.path.display()),
        }
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Remove the document. The only present → absent transition.
    ///
    /// Returns `false` if there was nothing to remove.
    pub fn delete(&self) -> Result<bool, StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::warn!("document deleted at {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(write_err(&self.path, e)),
        }
    }
}

/// `<dir>/<file>.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
