//! Error types for vellum-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration, document store and content
/// operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required configuration value is missing.
    #[error("missing configuration: {key} is not set; {hint}")]
    Configuration { key: &'static str, hint: &'static str },

    /// The document file did not exist where it was required to.
    #[error(
        "document not found at {path}; ensure the volume is mounted and the \
         database file exists (seed it with `vellum remote init`)"
    )]
    NotFound { path: PathBuf },

    /// The document file exists but could not be parsed as a document.
    #[error("failed to parse document at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading the document failed for a reason other than absence.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the document failed (permission denied, missing mount, ...).
    #[error("failed to write document at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Supplied data is not acceptable as a document or a field value.
    #[error("invalid document data: {0}")]
    Validation(String),

    /// The icon cap would be exceeded.
    #[error("maximum of {max} icons allowed")]
    IconLimit { max: usize },

    /// An icon with the derived id already exists.
    #[error("an icon with id '{id}' already exists")]
    IconIdCollision { id: String },

    #[error("icon '{id}' not found")]
    IconNotFound { id: String },

    #[error("page '{id}' not found")]
    PageNotFound { id: String },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`StoreError::Write`].
pub(crate) fn write_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Write {
        path: path.into(),
        source,
    }
}

/// Failures of the server-side init guard.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Bearer token absent or not equal to the configured credential.
    #[error("unauthorized: missing or invalid bearer token")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}
