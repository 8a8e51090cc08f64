//! Vellum — content store maintenance CLI.
//!
//! # Usage
//!
//! ```text
//! vellum init [--from <file>]
//! vellum check images|icons|paths
//! vellum sync db|images [--all]|all
//! vellum diff
//! vellum restore [--commit <rev>] [--dry-run]
//! vellum remote status|init [--from <file>] [--force]|upload|images
//! ```

mod client;
mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{
    check::CheckCommand, diff::DiffArgs, init::InitArgs, remote::RemoteCommand,
    restore::RestoreArgs, sync::SyncCommand,
};
use vellum_core::Config;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "vellum",
    version,
    about = "Maintain the site content document, its images and the deployed copy",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the local content document if it does not exist yet.
    Init(InitArgs),

    /// Audit the local document against the image and icon stores.
    Check {
        #[command(subcommand)]
        command: CheckCommand,
    },

    /// Push the local document and images into the deployed volume.
    Sync {
        #[command(subcommand)]
        command: SyncCommand,
    },

    /// Show a unified diff between the deployed and the local document.
    Diff(DiffArgs),

    /// Push the document from a git revision into the deployed volume.
    Restore(RestoreArgs),

    /// Talk to the deployed admin HTTP surface.
    Remote {
        #[command(subcommand)]
        command: RemoteCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env().context("failed to read configuration")?;
    match cli.command {
        Commands::Init(args) => args.run(&config),
        Commands::Check { command } => command.run(&config),
        Commands::Sync { command } => command.run(&config),
        Commands::Diff(args) => args.run(&config),
        Commands::Restore(args) => args.run(&config),
        Commands::Remote { command } => command.run(&config),
    }
}
