//! Remote sync protocol: directory discovery, document push, blob push.
//!
//! Every remote effect is a command issued through a [`RemoteTransport`].
//! Commands run strictly in sequence. The only fallback is the ordered walk
//! over candidate locations in [`discover_directory`]; nothing is retried.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use vellum_blobs::{is_safe_name, BlobStore};
use vellum_scanner::extract_blob_filenames_under;

use crate::command::{
    cat_command, cleanup_write_command, mkdir_command, probe_dir_command, remote_join,
    remote_parent, sha256_command, write_base64_commands, EXIT_TOOL_MISSING,
};
use crate::error::{io_err, SyncError};
use crate::transport::{RemoteOutput, RemoteTransport};

// ---------------------------------------------------------------------------
// Directory discovery
// ---------------------------------------------------------------------------

/// Adopt the first candidate directory that `mkdir -p` succeeds on.
///
/// A transport error aborts immediately; a failing command moves on to the
/// next candidate.
pub fn discover_directory<T: RemoteTransport + ?Sized>(
    transport: &T,
    candidates: &[String],
) -> Result<String, SyncError> {
    let idx = discover_index(transport, candidates.iter().map(String::as_str))?;
    Ok(candidates[idx].clone())
}

fn discover_index<'a, T, I>(transport: &T, dirs: I) -> Result<usize, SyncError>
where
    T: RemoteTransport + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let mut tried = Vec::new();
    for (idx, dir) in dirs.into_iter().enumerate() {
        let out = transport.run(&mkdir_command(dir))?;
        if out.success() {
            tracing::debug!("using remote directory {dir}");
            return Ok(idx);
        }
        tracing::debug!(
            "remote directory {dir} unusable (exit {}): {}",
            out.exit_code,
            out.stderr.trim()
        );
        tried.push(dir.to_string());
    }
    Err(SyncError::NoUsableCandidate { candidates: tried })
}

/// Writability of a remote directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirStatus {
    Writable,
    ReadOnly,
    Missing,
    /// The probe itself failed or printed something unexpected.
    Unknown,
}

pub fn probe_directory<T: RemoteTransport + ?Sized>(
    transport: &T,
    dir: &str,
) -> Result<DirStatus, SyncError> {
    let out = transport.run(&probe_dir_command(dir))?;
    if !out.success() {
        return Ok(DirStatus::Unknown);
    }
    Ok(match out.stdout.trim() {
        "writable" => DirStatus::Writable,
        "readonly" => DirStatus::ReadOnly,
        "missing" => DirStatus::Missing,
        _ => DirStatus::Unknown,
    })
}

fn run_checked<T: RemoteTransport + ?Sized>(
    transport: &T,
    command: &str,
    action: &str,
) -> Result<RemoteOutput, SyncError> {
    let out = transport.run(command)?;
    if !out.success() {
        return Err(SyncError::RemoteCommand {
            action: action.to_string(),
            exit_code: out.exit_code,
            stderr: out.stderr.trim().to_string(),
        });
    }
    Ok(out)
}

fn write_remote<T: RemoteTransport + ?Sized>(
    transport: &T,
    remote_path: &str,
    bytes: &[u8],
) -> Result<(), SyncError> {
    let action = format!("writing {remote_path}");
    for command in write_base64_commands(remote_path, bytes) {
        match run_checked(transport, &command, &action) {
            Ok(_) => {}
            Err(err @ SyncError::Transport(_)) => return Err(err),
            Err(err) => {
                discard_staging(transport, remote_path);
                return Err(err);
            }
        }
    }
    Ok(())
}

/// Best effort; the write already failed.
fn discard_staging<T: RemoteTransport + ?Sized>(transport: &T, remote_path: &str) {
    match transport.run(&cleanup_write_command(remote_path)) {
        Ok(out) if out.success() => {}
        Ok(out) => tracing::debug!(
            "could not remove staging files for {remote_path} (exit {})",
            out.exit_code
        ),
        Err(e) => tracing::debug!("could not remove staging files for {remote_path}: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Document push
// ---------------------------------------------------------------------------

/// Outcome of a successful document push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentPush {
    pub remote_path: String,
    pub bytes: usize,
    /// Hex SHA-256 of the pushed bytes.
    pub digest: String,
    /// Whether the remote copy was checked against `digest`.
    pub verified: bool,
}

/// Read and validate the local document. Returns raw text and parsed tree.
pub fn read_local_document(path: &Path) -> Result<(String, Value), SyncError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SyncError::LocalSourceMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(io_err(path, e)),
    };
    let value: Value = serde_json::from_str(&raw).map_err(|e| SyncError::InvalidDocument {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(SyncError::InvalidDocument {
            path: path.to_path_buf(),
            reason: "must be a JSON object".into(),
        });
    }
    Ok((raw, value))
}

/// Copy the local document file to the first usable remote candidate.
///
/// Candidates are full file paths; discovery runs over their parent
/// directories.
pub fn push_document<T: RemoteTransport + ?Sized>(
    transport: &T,
    local_path: &Path,
    candidates: &[String],
) -> Result<DocumentPush, SyncError> {
    let (raw, value) = read_local_document(local_path)?;
    let count = |key: &str| value.get(key).and_then(Value::as_array).map_or(0, Vec::len);
    tracing::info!(
        "local document: {} pages, {} team members, {} services, {} bytes",
        count("pages"),
        count("team"),
        count("services"),
        raw.len()
    );
    push_document_text(transport, &raw, candidates)
}

/// [`push_document`] for document text that did not come from the local
/// store. The caller validates `raw`.
pub fn push_document_text<T: RemoteTransport + ?Sized>(
    transport: &T,
    raw: &str,
    candidates: &[String],
) -> Result<DocumentPush, SyncError> {
    let idx = discover_index(transport, candidates.iter().map(|c| remote_parent(c)))?;
    let remote_path = candidates[idx].clone();
    let dir = remote_parent(&remote_path).to_string();

    match probe_directory(transport, &dir)? {
        DirStatus::ReadOnly => return Err(SyncError::RemoteReadOnly { dir }),
        DirStatus::Missing => return Err(SyncError::RemoteMissing { dir }),
        DirStatus::Unknown => tracing::debug!("could not probe {dir}, writing anyway"),
        DirStatus::Writable => {}
    }

    write_remote(transport, &remote_path, raw.as_bytes())?;
    let digest = hex::encode(Sha256::digest(raw.as_bytes()));
    let verified = verify_remote(transport, &remote_path, &digest)?;
    tracing::info!("document written to {remote_path}");

    Ok(DocumentPush {
        remote_path,
        bytes: raw.len(),
        digest,
        verified,
    })
}

/// Compare the remote file's SHA-256 with `expected`.
///
/// Returns `Ok(false)` when the remote has no `sha256sum`.
fn verify_remote<T: RemoteTransport + ?Sized>(
    transport: &T,
    remote_path: &str,
    expected: &str,
) -> Result<bool, SyncError> {
    let out = transport.run(&sha256_command(remote_path))?;
    if out.exit_code == EXIT_TOOL_MISSING {
        tracing::warn!("sha256sum not available remotely; skipping verification of {remote_path}");
        return Ok(false);
    }
    if !out.success() {
        return Err(SyncError::RemoteCommand {
            action: format!("verifying {remote_path}"),
            exit_code: out.exit_code,
            stderr: out.stderr.trim().to_string(),
        });
    }
    let actual = out.stdout.split_whitespace().next().unwrap_or_default();
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(SyncError::VerifyMismatch {
            path: remote_path.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// Blob push
// ---------------------------------------------------------------------------

/// Which local blobs a push covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobSelection {
    /// Every file in the local blob directory.
    All,
    /// Only names the local document references.
    Referenced,
}

/// Resolve a selection to blob names.
///
/// `Referenced` may name files that do not exist locally; the push counts
/// those as skipped.
pub fn select_blobs(
    local_doc: &Value,
    blobs: &BlobStore,
    selection: BlobSelection,
) -> Result<BTreeSet<String>, SyncError> {
    Ok(match selection {
        BlobSelection::All => blobs.names()?.into_iter().collect(),
        BlobSelection::Referenced => extract_blob_filenames_under(local_doc, blobs.public_base()),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobFailure {
    pub name: String,
    pub reason: String,
}

/// Per-item accounting of a blob batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlobPushReport {
    /// `None` when there was nothing to push and no directory was probed.
    pub remote_dir: Option<String>,
    pub succeeded: usize,
    /// Named but absent locally.
    pub skipped: usize,
    pub failed: usize,
    pub skipped_names: Vec<String>,
    pub failures: Vec<BlobFailure>,
}

impl BlobPushReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn fail(&mut self, name: &str, reason: impl ToString) {
        tracing::warn!("failed to push {name}: {}", reason.to_string());
        self.failed += 1;
        self.failures.push(BlobFailure {
            name: name.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Push `names` from `local_dir` into the first usable remote candidate.
///
/// Directory discovery failure and a broken transport are fatal. Any other
/// failure is accounted to its item and the batch continues.
pub fn push_blobs<'a, T, I>(
    transport: &T,
    local_dir: &Path,
    names: I,
    candidates: &[String],
) -> Result<BlobPushReport, SyncError>
where
    T: RemoteTransport + ?Sized,
    I: IntoIterator<Item = &'a String>,
{
    let names: Vec<&String> = names.into_iter().collect();
    let mut report = BlobPushReport::default();
    if names.is_empty() {
        tracing::info!("no images to push");
        return Ok(report);
    }

    let remote_dir = discover_directory(transport, candidates)?;
    tracing::info!("pushing {} images to {remote_dir}", names.len());

    for name in names {
        if !is_safe_name(name) {
            report.fail(name, "not a plain file name");
            continue;
        }
        let local: PathBuf = local_dir.join(name);
        if !local.is_file() {
            tracing::warn!("{name} is referenced but missing locally, skipping");
            report.skipped += 1;
            report.skipped_names.push(name.clone());
            continue;
        }
        let bytes = match fs::read(&local) {
            Ok(bytes) => bytes,
            Err(e) => {
                report.fail(name, io_err(&local, e));
                continue;
            }
        };
        match write_remote(transport, &remote_join(&remote_dir, name), &bytes) {
            Ok(()) => {
                tracing::info!("pushed {name} ({} bytes)", bytes.len());
                report.succeeded += 1;
            }
            Err(SyncError::Transport(e)) => return Err(e.into()),
            Err(e) => report.fail(name, e),
        }
    }

    report.remote_dir = Some(remote_dir);
    Ok(report)
}

// ---------------------------------------------------------------------------
// Remote read-back
// ---------------------------------------------------------------------------

/// Read the remote document from the first candidate that `cat` succeeds on.
///
/// Returns `(remote path, contents)`, or `None` if no candidate exists.
pub fn fetch_remote_document<T: RemoteTransport + ?Sized>(
    transport: &T,
    candidates: &[String],
) -> Result<Option<(String, String)>, SyncError> {
    for path in candidates {
        let out = transport.run(&cat_command(path))?;
        if out.success() {
            return Ok(Some((path.clone(), out.stdout)));
        }
        tracing::debug!("no remote document at {path}");
    }
    Ok(None)
}
