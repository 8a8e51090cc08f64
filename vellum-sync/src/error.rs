//! Error types for vellum-sync.
//!
//! Transport failures (the command channel itself is unusable) and data
//! failures (what we tried to send or found on the other side is wrong) are
//! separate variants, raised where they happen.

use std::path::PathBuf;

use thiserror::Error;
use vellum_blobs::BlobError;

/// Failures of the command channel itself.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(
        "'{program}' was not found on PATH; install it (npm install -g @railway/cli) \
         or set the transport program"
    )]
    CommandNotFound { program: String },

    #[error("'{program}' is not authenticated ({detail}); run `{program} login` and `{program} link`")]
    NotAuthenticated { program: String, detail: String },

    #[error("'{program}' is installed but not usable: {detail}")]
    Unavailable { program: String, detail: String },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("local document not found at {path}; run `vellum init` or set DATABASE_PATH")]
    LocalSourceMissing { path: PathBuf },

    #[error("local document at {path} is not a valid document: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    #[error(
        "none of the remote locations could be created: {}; check the volume mount \
         or set REMOTE_DB_PATHS / REMOTE_IMAGE_PATHS",
        .candidates.join(", ")
    )]
    NoUsableCandidate { candidates: Vec<String> },

    #[error("remote directory {dir} is read-only; is the volume mounted read-write?")]
    RemoteReadOnly { dir: String },

    #[error("remote directory {dir} does not exist; is the volume mounted?")]
    RemoteMissing { dir: String },

    #[error("remote command failed while {action} (exit {exit_code}): {stderr}")]
    RemoteCommand {
        action: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("remote copy of {path} does not match: expected sha256 {expected}, got {actual}")]
    VerifyMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
