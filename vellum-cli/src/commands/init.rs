//! `vellum init [--from <file>]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use vellum_core::{Config, DocumentStore};

use super::read_seed;

/// Create the local content document if it does not exist yet.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Seed the document from this JSON file instead of the default content.
    #[arg(long, value_name = "FILE")]
    pub from: Option<PathBuf>,
}

impl InitArgs {
    pub fn run(self, config: &Config) -> Result<()> {
        let store = DocumentStore::from_config(config);
        let written = match &self.from {
            Some(path) => {
                let seed = read_seed(path)?;
                store
                    .initialize_with_data(seed)
                    .with_context(|| format!("failed to seed from '{}'", path.display()))?
            }
            None => store.initialize().context("failed to initialize document")?,
        };

        if written {
            println!("{} Created {}", "✓".green(), store.path().display());
        } else {
            println!(
                "{} Document already exists at {}; left untouched",
                "·".dimmed(),
                store.path().display()
            );
        }
        Ok(())
    }
}
