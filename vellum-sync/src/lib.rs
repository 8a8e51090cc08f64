//! # vellum-sync
//!
//! Copies the local document and image blobs to a remote volume that is
//! only reachable by running shell commands in the deployment.
//!
//! - [`transport`] — [`RemoteTransport`] and the process-backed [`ShellTransport`]
//! - [`command`] — every remote shell command, built and quoted in one place
//! - [`protocol`] — discovery, probing, document and blob pushes
//! - [`pipeline`] — [`sync_all`]
//! - [`diff`] — local vs remote document comparison

pub mod command;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod transport;

pub use diff::diff_documents;
pub use error::{SyncError, TransportError};
pub use pipeline::{sync_all, SyncAllReport, SyncPlan};
pub use protocol::{
    discover_directory, fetch_remote_document, probe_directory, push_blobs, push_document,
    push_document_text, read_local_document, select_blobs, BlobFailure, BlobPushReport,
    BlobSelection, DirStatus, DocumentPush,
};
pub use transport::{RemoteOutput, RemoteTransport, ShellTransport};
