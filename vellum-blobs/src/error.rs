//! Error types for vellum-blobs.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    /// No blob with that name, or the name is not a plain file name.
    #[error("image '{name}' not found")]
    NotFound { name: String },

    /// The declared media type is not an image type.
    #[error("only image uploads are allowed (got '{mime}')")]
    InvalidMediaType { mime: String },

    /// Every collision suffix up to the bound was taken.
    #[error("no free file name for '{name}' after {attempts} attempts")]
    Exhausted { name: String, attempts: usize },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BlobError {
    BlobError::Io {
        path: path.into(),
        source,
    }
}
