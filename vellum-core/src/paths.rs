//! Store location resolution.
//!
//! Relative locations (`./data/...`, `../data/...`, or any non-absolute
//! path) are development checkouts and resolve against the configured
//! working directory. Absolute locations point at a mounted volume and are
//! used verbatim.
//!
//! Resolving a location attempts to create its directory. A failure there is
//! logged and ignored: the volume may not be mounted yet at build time, and
//! the store creates the directory again right before its first write.

use std::path::{Component, Path, PathBuf};

use crate::config::Config;

/// File name the document store always uses.
pub const DOCUMENT_FILE_NAME: &str = "database.json";

/// Development default for the document store, relative to the working dir.
pub const DEFAULT_DOCUMENT_LOCATION: &str = "./data/database.json";

/// Development default for the image store, relative to the working dir.
pub const DEFAULT_BLOB_LOCATION: &str = "./data/images";

/// Everything the stores need to know about where they live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub document_path: PathBuf,
    pub blob_dir: PathBuf,
    pub production: bool,
}

impl ResolvedPaths {
    pub fn resolve(config: &Config) -> Self {
        let document_path = resolve_document_path(config);
        let blob_dir = resolve_blob_directory(config);
        let production = is_production(
            config.environment.as_deref(),
            &document_path,
            &config.production_prefixes,
        );
        Self {
            document_path,
            blob_dir,
            production,
        }
    }
}

/// Resolve the document store file path.
pub fn resolve_document_path(config: &Config) -> PathBuf {
    let raw = config
        .database_path
        .as_deref()
        .unwrap_or(DEFAULT_DOCUMENT_LOCATION);
    let mut path = resolve_location(&config.working_dir, raw);
    if path.file_name().map_or(true, |name| name != DOCUMENT_FILE_NAME) {
        path.push(DOCUMENT_FILE_NAME);
    }
    if let Some(parent) = path.parent() {
        ensure_dir_best_effort(parent);
    }
    path
}

/// Resolve the image store directory.
///
/// Order: explicit location, then `<volume mount>/images`, then the
/// development default under the working directory.
pub fn resolve_blob_directory(config: &Config) -> PathBuf {
    let dir = match (&config.image_store, &config.volume_mount) {
        (Some(raw), _) => resolve_location(&config.working_dir, raw),
        (None, Some(mount)) => mount.join("images"),
        (None, None) => resolve_location(&config.working_dir, DEFAULT_BLOB_LOCATION),
    };
    ensure_dir_best_effort(&dir);
    dir
}

/// Whether the store runs against production data.
///
/// Either signal is sufficient: an explicit `production` designation, or a
/// resolved path living under one of the production volume prefixes. The
/// designation is not always propagated to every process, so the path shape
/// backs it up.
pub fn is_production(env_flag: Option<&str>, resolved_path: &Path, prefixes: &[PathBuf]) -> bool {
    if env_flag.is_some_and(|flag| flag.trim().eq_ignore_ascii_case("production")) {
        return true;
    }
    resolved_path.is_absolute() && prefixes.iter().any(|prefix| resolved_path.starts_with(prefix))
}

/// Join relative locations onto `working_dir`, keep absolute ones, and
/// normalise away `.` components and trailing slashes.
fn resolve_location(working_dir: &Path, raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let trimmed = if trimmed.len() > 1 {
        trimmed.trim_end_matches('/')
    } else {
        trimmed
    };
    let location = Path::new(trimmed);
    let joined = if location.is_absolute() {
        location.to_path_buf()
    } else {
        working_dir.join(location)
    };
    normalize(&joined)
}

/// Lexical normalisation: drops `.` and folds `..` where a parent exists.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn ensure_dir_best_effort(dir: &Path) {
    if dir.as_os_str().is_empty() || dir.exists() {
        return;
    }
    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::warn!(
            "could not create {} yet ({e}); it will be created before the first write",
            dir.display()
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
