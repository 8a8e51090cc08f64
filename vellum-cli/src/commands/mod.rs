pub mod check;
pub mod diff;
pub mod init;
pub mod remote;
pub mod restore;
pub mod sync;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Parse a JSON seed file passed with `--from`.
pub(crate) fn read_seed(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("'{}' is not valid JSON", path.display()))
}
