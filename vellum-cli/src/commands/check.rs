//! `vellum check images|icons|paths` — local reference audits.

use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use vellum_blobs::BlobStore;
use vellum_core::{Config, Document, DocumentStore, ResolvedPaths};
use vellum_scanner::{audit_icons, audit_images_under, find_blob_references_under};

#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Every image the document references must exist in the image store.
    Images,
    /// Every icon id the document references must exist in the icon list.
    Icons,
    /// Show where the stores resolve to.
    Paths,
}

impl CheckCommand {
    pub fn run(self, config: &Config) -> Result<()> {
        match self {
            CheckCommand::Images => check_images(config),
            CheckCommand::Icons => check_icons(config),
            CheckCommand::Paths => {
                print_paths(config);
                Ok(())
            }
        }
    }
}

#[derive(Tabled)]
struct ReferenceRow {
    #[tabled(rename = "field")]
    path: String,
    #[tabled(rename = "value")]
    value: String,
    #[tabled(rename = "status")]
    status: String,
}

fn load_document(config: &Config) -> Result<Document> {
    let store = DocumentStore::from_config(config);
    store
        .load()
        .with_context(|| format!("cannot load {}", store.path().display()))
}

fn check_images(config: &Config) -> Result<()> {
    let doc = load_document(config)?;
    let tree = doc.to_value().context("failed to serialize document")?;
    let blobs = BlobStore::from_config(config);
    let local: BTreeSet<String> = blobs
        .names()
        .context("failed to list image store")?
        .into_iter()
        .collect();

    let audit = audit_images_under(&tree, blobs.public_base(), &local);
    let rows = image_rows(&tree, blobs.public_base(), &local);

    if rows.is_empty() {
        println!("No image references in the document.");
    } else {
        println!("{}", Table::new(rows).with(Style::rounded()));
    }
    println!(
        "{} referenced, {} present in {}",
        audit.present.len() + audit.missing.len(),
        audit.present.len(),
        blobs.dir().display()
    );

    if !audit.is_clean() {
        for name in &audit.missing {
            eprintln!("  {} {name}", "✗".red());
        }
        bail!("{} referenced image(s) missing locally", audit.missing.len());
    }
    println!("{} All referenced images exist", "✓".green());
    Ok(())
}

/// One row per reference; the status compares the exact stored name.
fn image_rows(tree: &Value, base: &str, local: &BTreeSet<String>) -> Vec<ReferenceRow> {
    find_blob_references_under(tree, base)
        .into_iter()
        .map(|r| ReferenceRow {
            status: if local.contains(&r.name) {
                "ok".green().to_string()
            } else {
                "missing".red().to_string()
            },
            path: r.path,
            value: r.value,
        })
        .collect()
}

fn check_icons(config: &Config) -> Result<()> {
    let doc = load_document(config)?;
    let audit = audit_icons(&doc);

    println!(
        "{} icons defined, {} distinct ids referenced",
        doc.icons.len(),
        audit.referenced.len()
    );
    if !audit.unused.is_empty() {
        let unused: Vec<&str> = audit.unused.iter().map(|id| id.0.as_str()).collect();
        println!("  unused: {}", unused.join(", ").dimmed());
    }

    if !audit.is_clean() {
        let rows: Vec<ReferenceRow> = audit
            .missing
            .iter()
            .map(|r| ReferenceRow {
                path: r.path.clone(),
                value: r.id.clone(),
                status: "missing".red().to_string(),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
        bail!("{} icon reference(s) point at undefined icons", audit.missing.len());
    }
    println!("{} All icon references resolve", "✓".green());
    Ok(())
}

fn print_paths(config: &Config) {
    let paths = ResolvedPaths::resolve(config);
    let mode = if paths.production {
        "production".yellow()
    } else {
        "development".green()
    };
    println!("document:    {}", paths.document_path.display());
    println!("images:      {}", paths.blob_dir.display());
    println!("image base:  {}", config.image_base);
    println!("mode:        {mode}");
    println!("environment: {}", config.environment_label());
}
