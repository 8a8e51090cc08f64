//! Process configuration.
//!
//! A [`Config`] is built once at process start from an environment-style
//! lookup and passed by reference into every store and sync component.
//! Nothing in the workspace reads the environment after that point.
//!
//! Tests must build configs with [`Config::from_lookup`] or
//! [`Config::for_dir`]; never with [`Config::from_env`].

use std::path::{Path, PathBuf};

use crate::error::{io_err, StoreError};

/// Recognized configuration keys.
pub mod keys {
    pub const DATABASE_PATH: &str = "DATABASE_PATH";
    pub const IMAGE_STORE: &str = "IMAGE_STORE";
    pub const IMAGE_BASE: &str = "IMAGE_BASE";
    pub const VOLUME_MOUNT_PATH: &str = "VOLUME_MOUNT_PATH";
    pub const RAILWAY_VOLUME_MOUNT_PATH: &str = "RAILWAY_VOLUME_MOUNT_PATH";
    pub const APP_ENV: &str = "APP_ENV";
    pub const NODE_ENV: &str = "NODE_ENV";
    pub const PRODUCTION_VOLUME_PREFIXES: &str = "PRODUCTION_VOLUME_PREFIXES";
    pub const REMOTE_SERVICE: &str = "REMOTE_SERVICE";
    pub const REMOTE_DB_PATHS: &str = "REMOTE_DB_PATHS";
    pub const REMOTE_IMAGE_PATHS: &str = "REMOTE_IMAGE_PATHS";
    pub const FORCE_OVERWRITE: &str = "FORCE_OVERWRITE";
    pub const FORCE: &str = "FORCE";
    pub const ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
    pub const PRODUCTION_URL: &str = "PRODUCTION_URL";
    pub const RESTORE_COMMIT: &str = "RESTORE_COMMIT";
}

pub const DEFAULT_IMAGE_BASE: &str = "/images";
pub const DEFAULT_REMOTE_SERVICE: &str = "web";
pub const DEFAULT_RESTORE_COMMIT: &str = "HEAD";
pub const DEFAULT_PRODUCTION_PREFIXES: &[&str] = &["/data", "/app/data"];
pub const DEFAULT_REMOTE_DB_PATHS: &[&str] = &["/data/database.json", "/app/data/database.json"];
pub const DEFAULT_REMOTE_IMAGE_PATHS: &[&str] = &["/data/images", "/app/data/images"];

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory relative store locations are resolved against.
    pub working_dir: PathBuf,
    /// Raw document store location override.
    pub database_path: Option<String>,
    /// Raw image store location override.
    pub image_store: Option<String>,
    /// Public URL base images are served under, without trailing slash.
    pub image_base: String,
    /// Mount point of the persistent volume, when the platform reports one.
    pub volume_mount: Option<PathBuf>,
    /// Explicit environment designation (`production`, `development`, ...).
    pub environment: Option<String>,
    /// Absolute path prefixes that identify a production volume.
    pub production_prefixes: Vec<PathBuf>,
    /// Remote service identifier passed to the command transport.
    pub remote_service: String,
    /// Ordered remote document path candidates.
    pub remote_db_paths: Vec<String>,
    /// Ordered remote image directory candidates.
    pub remote_image_paths: Vec<String>,
    pub force_overwrite: bool,
    pub admin_password: Option<String>,
    pub production_url: Option<String>,
    /// Git revision `vellum restore` reads the document from.
    pub restore_commit: String,
}

impl Config {
    /// Build from the process environment and current working directory.
    pub fn from_env() -> Result<Self, StoreError> {
        let cwd = std::env::current_dir().map_err(|e| io_err(".", e))?;
        Ok(Self::from_lookup(cwd, |key| std::env::var(key).ok()))
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(working_dir: impl Into<PathBuf>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_either = |primary: &str, fallback: &str| get(primary).or_else(|| get(fallback));

        let image_base = get(keys::IMAGE_BASE)
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE.to_string());

        let production_prefixes = get(keys::PRODUCTION_VOLUME_PREFIXES)
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|| owned(DEFAULT_PRODUCTION_PREFIXES))
            .into_iter()
            .map(PathBuf::from)
            .collect();

        let force_overwrite = get_either(keys::FORCE_OVERWRITE, keys::FORCE)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        Self {
            working_dir: working_dir.into(),
            database_path: get(keys::DATABASE_PATH),
            image_store: get(keys::IMAGE_STORE),
            image_base,
            volume_mount: get_either(keys::VOLUME_MOUNT_PATH, keys::RAILWAY_VOLUME_MOUNT_PATH)
                .map(PathBuf::from),
            environment: get_either(keys::APP_ENV, keys::NODE_ENV),
            production_prefixes,
            remote_service: get(keys::REMOTE_SERVICE)
                .unwrap_or_else(|| DEFAULT_REMOTE_SERVICE.to_string()),
            remote_db_paths: get(keys::REMOTE_DB_PATHS)
                .map(|raw| split_list(&raw))
                .unwrap_or_else(|| owned(DEFAULT_REMOTE_DB_PATHS)),
            remote_image_paths: get(keys::REMOTE_IMAGE_PATHS)
                .map(|raw| split_list(&raw))
                .unwrap_or_else(|| owned(DEFAULT_REMOTE_IMAGE_PATHS)),
            force_overwrite,
            admin_password: get(keys::ADMIN_PASSWORD),
            production_url: get(keys::PRODUCTION_URL)
                .map(|u| u.trim_end_matches('/').to_string()),
            restore_commit: get(keys::RESTORE_COMMIT)
                .unwrap_or_else(|| DEFAULT_RESTORE_COMMIT.to_string()),
        }
    }

    /// All defaults, rooted at `working_dir`.
    pub fn for_dir(working_dir: &Path) -> Self {
        Self::from_lookup(working_dir, |_| None)
    }

    /// The operator credential, or a [`StoreError::Configuration`] naming the key.
    pub fn require_admin_password(&self) -> Result<&str, StoreError> {
        self.admin_password
            .as_deref()
            .ok_or(StoreError::Configuration {
                key: keys::ADMIN_PASSWORD,
                hint: "export ADMIN_PASSWORD=<password> before running this command",
            })
    }

    /// The deployed admin surface base URL.
    pub fn require_production_url(&self) -> Result<&str, StoreError> {
        self.production_url
            .as_deref()
            .ok_or(StoreError::Configuration {
                key: keys::PRODUCTION_URL,
                hint: "export PRODUCTION_URL=https://<your-deployment> before running this command",
            })
    }

    /// Environment designation as reported to status callers.
    pub fn environment_label(&self) -> &str {
        self.environment.as_deref().unwrap_or("development")
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
