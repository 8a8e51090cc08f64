//! Full sync entrypoint used by `vellum sync all`.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use vellum_blobs::BlobStore;
use vellum_core::{paths, Config};

use crate::protocol::{
    push_blobs, push_document, read_local_document, select_blobs, BlobPushReport, BlobSelection,
    DocumentPush,
};
use crate::transport::RemoteTransport;
use crate::SyncError;

/// Local sources and remote candidates for one run.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub document_path: PathBuf,
    pub blobs: BlobStore,
    pub remote_db_paths: Vec<String>,
    pub remote_image_paths: Vec<String>,
}

impl SyncPlan {
    pub fn from_config(config: &Config) -> Self {
        Self {
            document_path: paths::resolve_document_path(config),
            blobs: BlobStore::from_config(config),
            remote_db_paths: config.remote_db_paths.clone(),
            remote_image_paths: config.remote_image_paths.clone(),
        }
    }

    /// Push the images `selection` names. Only `Referenced` reads the local
    /// document.
    pub fn push_images<T: RemoteTransport + ?Sized>(
        &self,
        transport: &T,
        selection: BlobSelection,
    ) -> Result<BlobPushReport, SyncError> {
        let tree = match selection {
            BlobSelection::All => Value::Null,
            BlobSelection::Referenced => read_local_document(&self.document_path)?.1,
        };
        let names = select_blobs(&tree, &self.blobs, selection)?;
        push_blobs(transport, self.blobs.dir(), &names, &self.remote_image_paths)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncAllReport {
    pub document: DocumentPush,
    /// Selection the blob report was produced with.
    pub selection: Option<BlobSelection>,
    /// `None` when both blob attempts failed fatally.
    pub blobs: Option<BlobPushReport>,
    pub blob_error: Option<String>,
}

impl SyncAllReport {
    pub fn is_success(&self) -> bool {
        self.blobs.as_ref().is_some_and(BlobPushReport::is_success)
    }
}

/// Preflight, push the document, then push images.
///
/// The document push is fatal. Images go referenced-first; if that attempt
/// fails as a whole, every local image is tried instead, and if that fails
/// too the report records it and the run still returns `Ok`.
pub fn sync_all<T: RemoteTransport + ?Sized>(
    transport: &T,
    plan: &SyncPlan,
) -> Result<SyncAllReport, SyncError> {
    transport.preflight()?;
    let document = push_document(transport, &plan.document_path, &plan.remote_db_paths)?;

    let attempt = |selection| plan.push_images(transport, selection);

    let (selection, blobs, blob_error) = match attempt(BlobSelection::Referenced) {
        Ok(report) => (Some(BlobSelection::Referenced), Some(report), None),
        Err(first) => {
            tracing::warn!("referenced image sync failed ({first}); falling back to all images");
            match attempt(BlobSelection::All) {
                Ok(report) => (Some(BlobSelection::All), Some(report), None),
                Err(second) => {
                    tracing::warn!("image sync failed ({second}); the document was synced");
                    (None, None, Some(second.to_string()))
                }
            }
        }
    };

    Ok(SyncAllReport {
        document,
        selection,
        blobs,
        blob_error,
    })
}
