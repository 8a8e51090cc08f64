//! `vellum sync db|images|all` — push local content into the deployed volume.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;

use vellum_core::Config;
use vellum_sync::{
    push_document, sync_all, BlobPushReport, BlobSelection, DocumentPush, RemoteTransport,
    ShellTransport, SyncPlan,
};

#[derive(Subcommand, Debug)]
pub enum SyncCommand {
    /// Copy the local document to the first usable remote location.
    Db,
    /// Copy images the document references.
    Images {
        /// Copy every local image, referenced or not.
        #[arg(long)]
        all: bool,
    },
    /// Document first, then images.
    All,
}

impl SyncCommand {
    pub fn run(self, config: &Config) -> Result<()> {
        let transport = ShellTransport::from_config(config);
        let plan = SyncPlan::from_config(config);
        match self {
            SyncCommand::Db => {
                preflight(&transport)?;
                let pushed = push_document(&transport, &plan.document_path, &plan.remote_db_paths)
                    .context("document sync failed")?;
                print_document(&pushed);
                Ok(())
            }
            SyncCommand::Images { all } => {
                preflight(&transport)?;
                let selection = if all {
                    BlobSelection::All
                } else {
                    BlobSelection::Referenced
                };
                let report = plan
                    .push_images(&transport, selection)
                    .context("image sync failed")?;
                print_blobs(selection, &report);
                ensure_blobs(&report)
            }
            SyncCommand::All => {
                let report = sync_all(&transport, &plan).context("sync failed")?;
                print_document(&report.document);
                match (&report.blobs, report.selection) {
                    (Some(blobs), Some(selection)) => {
                        print_blobs(selection, blobs);
                        ensure_blobs(blobs)
                    }
                    _ => bail!(
                        "document synced, but image sync failed: {}",
                        report.blob_error.as_deref().unwrap_or("unknown error")
                    ),
                }
            }
        }
    }
}

fn preflight(transport: &ShellTransport) -> Result<()> {
    transport.preflight().with_context(|| {
        format!(
            "'{}' is not ready; install it and log in before syncing",
            transport.program()
        )
    })
}

fn print_document(pushed: &DocumentPush) {
    let check = if pushed.verified {
        "verified".green()
    } else {
        "unverified".yellow()
    };
    println!(
        "{} Document → {} ({} bytes, {check})",
        "✓".green(),
        pushed.remote_path,
        pushed.bytes
    );
}

fn print_blobs(selection: BlobSelection, report: &BlobPushReport) {
    let scope = match selection {
        BlobSelection::All => "all images",
        BlobSelection::Referenced => "referenced images",
    };
    let Some(dir) = &report.remote_dir else {
        println!("{} No {scope} to sync", "·".dimmed());
        return;
    };
    println!(
        "{} {} → {dir} ({} uploaded, {} skipped, {} failed)",
        if report.is_success() {
            "✓".green()
        } else {
            "✗".red()
        },
        scope,
        report.succeeded,
        report.skipped,
        report.failed
    );
    for name in &report.skipped_names {
        println!("  {}  {name} (missing locally)", "·".dimmed());
    }
    for failure in &report.failures {
        eprintln!("  {}  {}: {}", "✗".red(), failure.name, failure.reason);
    }
}

fn ensure_blobs(report: &BlobPushReport) -> Result<()> {
    if !report.is_success() {
        bail!("{} image(s) failed to sync", report.failed);
    }
    Ok(())
}
