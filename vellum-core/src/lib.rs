//! Vellum core library: configuration, path resolution, the site document
//! model, the file-backed document store and in-memory content operations.
//!
//! - [`config`] — [`Config`], built once per process
//! - [`paths`] — store location and production detection
//! - [`types`] — [`Document`], [`Page`], [`Icon`]
//! - [`store`] — [`DocumentStore`] read / write / initialize
//! - [`content`] — page and icon mutations
//! - [`admin`] — idempotent initialization guard for the admin surface
//! - [`error`] — [`StoreError`], [`AdminError`]

pub mod admin;
pub mod config;
pub mod content;
pub mod error;
pub mod paths;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{AdminError, StoreError};
pub use paths::ResolvedPaths;
pub use store::DocumentStore;
pub use types::{Document, DocumentSummary, Icon, IconId, Page, PageId, Timestamp, MAX_ICONS};
