//! Idempotent document initialization for the admin surface.
//!
//! These functions carry the decision logic of the `init-database` endpoint
//! without any HTTP framework attached: the caller extracts the
//! `Authorization` header and optional JSON body, and serializes the returned
//! response structs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::AdminError;
use crate::store::DocumentStore;
use crate::types::Document;

/// Verify an `Authorization` header against the configured credential.
///
/// An unset credential is a configuration failure, never an open door.
pub fn check_bearer(header: Option<&str>, config: &Config) -> Result<(), AdminError> {
    let password = config.require_admin_password()?;
    let expected = format!("Bearer {password}");
    match header {
        Some(value) if value.trim() == expected => Ok(()),
        _ => Err(AdminError::Unauthorized),
    }
}

/// What an initialization request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// No document existed; one was written.
    Initialized,
    /// A document existed and was left untouched.
    AlreadyExists,
    /// A document existed and was deliberately deleted and rewritten.
    Replaced,
}

impl InitOutcome {
    pub fn message(self) -> &'static str {
        match self {
            InitOutcome::Initialized => "Database initialized successfully",
            InitOutcome::AlreadyExists => "Database already exists",
            InitOutcome::Replaced => "Database replaced",
        }
    }

    pub fn response(self, store: &DocumentStore) -> InitResponse {
        InitResponse {
            message: self.message().to_string(),
            path: store.path().display().to_string(),
            exists: self == InitOutcome::AlreadyExists,
        }
    }
}

/// Body of a successful initialization response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResponse {
    pub message: String,
    pub path: String,
    /// True when the request was a no-op against an existing document.
    #[serde(default)]
    pub exists: bool,
}

/// Body of a status response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub path: String,
    pub exists: bool,
    pub environment: String,
}

/// Initialize the store, optionally from `body`.
///
/// Without `force`, an existing document is never modified. With `force`,
/// the existing document is removed through [`DocumentStore::delete`] first,
/// so the overwrite shows up in the logs.
pub fn init_database(
    store: &DocumentStore,
    body: Option<Value>,
    force: bool,
) -> Result<InitOutcome, AdminError> {
    // Reject a bad body before a forced delete can destroy the old document.
    if let Some(data) = &body {
        Document::from_value(data.clone())?;
    }
    let replaced = if store.exists() {
        if !force {
            tracing::info!("document already exists at {}", store.path().display());
            return Ok(InitOutcome::AlreadyExists);
        }
        store.delete()?
    } else {
        false
    };

    let written = match body {
        Some(data) => store.initialize_with_data(data)?,
        None => store.initialize()?,
    };
    Ok(match (written, replaced) {
        (false, _) => InitOutcome::AlreadyExists,
        (true, true) => InitOutcome::Replaced,
        (true, false) => InitOutcome::Initialized,
    })
}

/// Report where the document lives and whether it exists.
pub fn database_status(store: &DocumentStore, config: &Config) -> StatusResponse {
    StatusResponse {
        path: store.path().display().to_string(),
        exists: store.exists(),
        environment: config.environment_label().to_string(),
    }
}
