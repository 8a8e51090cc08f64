//! Flat-directory image blob store.
//!
//! Blobs are addressed by a sanitized filename that is unique within the
//! store directory. Names are never reused: an upload that collides with an
//! existing file gets a numeric suffix instead of replacing it.

pub mod error;
pub mod naming;
pub mod store;

pub use error::BlobError;
pub use naming::{is_safe_name, resolve_content_type, sanitize_filename};
pub use store::{Blob, BlobEntry, BlobStore, StoredBlob, MAX_NAME_ATTEMPTS};
