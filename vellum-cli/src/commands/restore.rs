//! `vellum restore` — push a document from git history into the deployed volume.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use vellum_core::{Config, Document};
use vellum_sync::{push_document_text, RemoteTransport, ShellTransport};

/// Repository paths tried in order at the chosen revision.
const HISTORY_PATHS: &[&str] = &["data/database.json", "database.json"];

/// Arguments for `vellum restore`.
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Git revision to restore from. Defaults to RESTORE_COMMIT, then HEAD.
    #[arg(long, value_name = "REV")]
    pub commit: Option<String>,

    /// Validate the historical document without pushing it.
    #[arg(long)]
    pub dry_run: bool,
}

impl RestoreArgs {
    pub fn run(self, config: &Config) -> Result<()> {
        let commit = self.commit.as_deref().unwrap_or(&config.restore_commit);
        let (source, raw) = document_at(&config.working_dir, commit)?;
        let doc = validate(&raw)
            .with_context(|| format!("{commit}:{source} is not a usable document"))?;
        println!("{} {commit}:{source} ({})", "✓".green(), doc.summary());

        if self.dry_run {
            println!("{} Dry run; nothing pushed", "·".dimmed());
            return Ok(());
        }

        let transport = ShellTransport::from_config(config);
        transport.preflight().with_context(|| {
            format!(
                "'{}' is not ready; install it and log in before restoring",
                transport.program()
            )
        })?;
        let pushed = push_document_text(&transport, &raw, &config.remote_db_paths)
            .context("restore failed")?;
        let check = if pushed.verified {
            "verified".green()
        } else {
            "unverified".yellow()
        };
        println!(
            "{} Restored → {} ({} bytes, {check})",
            "✓".green(),
            pushed.remote_path,
            pushed.bytes
        );
        Ok(())
    }
}

/// The first of [`HISTORY_PATHS`] present at `commit`, with its text.
fn document_at(repo: &Path, commit: &str) -> Result<(&'static str, String)> {
    let mut last_error = String::new();
    for &path in HISTORY_PATHS {
        let output = Command::new("git")
            .arg("-C")
            .arg(repo)
            .arg("show")
            .arg(format!("{commit}:{path}"))
            .output()
            .context("failed to run git; restore needs a git checkout")?;
        if output.status.success() {
            let raw = String::from_utf8(output.stdout)
                .with_context(|| format!("{commit}:{path} is not UTF-8"))?;
            return Ok((path, raw));
        }
        last_error = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::debug!("{commit}:{path} unavailable: {last_error}");
    }
    bail!(
        "no document at {commit} (tried {}): {last_error}",
        HISTORY_PATHS.join(", ")
    )
}

fn validate(raw: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(raw).context("invalid JSON")?;
    Ok(Document::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn historical_document_must_be_an_object() {
        assert!(validate(r#"{ "pages": [], "team": [{ "name": "Ada" }] }"#).is_ok());
        assert!(validate("[]").is_err());
        assert!(validate("{ not json").is_err());
        assert!(validate(r#"{ "pages": "home" }"#).is_err());
    }
}
