//! `vellum diff` — compare the deployed document with the local one.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use vellum_core::{paths, Config};
use vellum_sync::{diff_documents, fetch_remote_document, RemoteTransport, ShellTransport};

/// Arguments for `vellum diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Print nothing; exit 1 when the documents differ.
    #[arg(long)]
    pub quiet: bool,
}

impl DiffArgs {
    pub fn run(self, config: &Config) -> Result<()> {
        let local_path = paths::resolve_document_path(config);
        let local = std::fs::read_to_string(&local_path)
            .with_context(|| format!("cannot read local document '{}'", local_path.display()))?;

        let transport = ShellTransport::from_config(config);
        transport
            .preflight()
            .with_context(|| format!("'{}' is not ready", transport.program()))?;
        let Some((remote_path, remote)) =
            fetch_remote_document(&transport, &config.remote_db_paths)
                .context("failed to read the remote document")?
        else {
            bail!(
                "no remote document at any of: {}",
                config.remote_db_paths.join(", ")
            );
        };

        let diff = diff_documents(&local, &remote);
        if diff.is_empty() {
            if !self.quiet {
                println!("{} {remote_path} matches the local document", "✓".green());
            }
            return Ok(());
        }
        if self.quiet {
            bail!("documents differ");
        }

        for line in diff.lines() {
            if line.starts_with('+') && !line.starts_with("+++") {
                println!("{}", line.green());
            } else if line.starts_with('-') && !line.starts_with("---") {
                println!("{}", line.red());
            } else {
                println!("{line}");
            }
        }
        Ok(())
    }
}
