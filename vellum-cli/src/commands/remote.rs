//! `vellum remote status|init|upload|images` — operate on the deployment over HTTP.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use vellum_blobs::BlobStore;
use vellum_core::Config;
use vellum_scanner::IMAGE_EXTENSIONS;

use super::read_seed;
use crate::client::{AdminClient, ImageListing};

#[derive(Subcommand, Debug)]
pub enum RemoteCommand {
    /// Show where the deployed document lives and whether it exists.
    Status,

    /// Create the deployed document if it does not exist.
    Init {
        /// Seed the document from this JSON file.
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,

        /// Replace an existing document. Also enabled by FORCE_OVERWRITE=true.
        #[arg(long)]
        force: bool,
    },

    /// Upload local images the deployment does not have yet.
    Upload,

    /// List the deployment's images and where it stores them.
    Images,
}

impl RemoteCommand {
    pub fn run(self, config: &Config) -> Result<()> {
        let client = AdminClient::from_config(config)?;
        match self {
            RemoteCommand::Status => status(&client),
            RemoteCommand::Init { from, force } => {
                init(&client, from, force || config.force_overwrite)
            }
            RemoteCommand::Upload => upload(client, &BlobStore::from_config(config)),
            RemoteCommand::Images => images(client, &config.production_prefixes),
        }
    }
}

fn status(client: &AdminClient) -> Result<()> {
    let status = client
        .database_status()
        .with_context(|| format!("cannot query {}", client.base_url()))?;
    let state = if status.exists {
        "exists".green()
    } else {
        "missing".yellow()
    };
    println!("document:    {} ({state})", status.path);
    println!("environment: {}", status.environment);
    Ok(())
}

fn init(client: &AdminClient, from: Option<PathBuf>, force: bool) -> Result<()> {
    let seed = from.as_deref().map(read_seed).transpose()?;
    if force {
        println!(
            "{} Forced init: an existing remote document will be replaced",
            "!".yellow()
        );
    }
    let reply = client
        .init_database(seed.as_ref(), force)
        .with_context(|| format!("init request to {} failed", client.base_url()))?;

    if reply.exists {
        println!(
            "{} {}; rerun with --force to replace it",
            "·".dimmed(),
            reply.message
        );
    } else {
        println!("{} {} at {}", "✓".green(), reply.message, reply.path);
    }
    Ok(())
}

fn has_image_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn upload(mut client: AdminClient, blobs: &BlobStore) -> Result<()> {
    let local: Vec<String> = blobs
        .names()
        .context("failed to list local images")?
        .into_iter()
        .filter(|name| has_image_extension(name))
        .collect();
    if local.is_empty() {
        println!("No local images in {}", blobs.dir().display());
        return Ok(());
    }

    client
        .login()
        .with_context(|| format!("cannot log in to {}", client.base_url()))?;
    let existing = client.image_names().context("cannot list remote images")?;

    let (mut uploaded, mut skipped, mut failed) = (0usize, 0usize, 0usize);
    for name in &local {
        if existing.contains(name) {
            println!("  {}  {name} (already uploaded)", "·".dimmed());
            skipped += 1;
            continue;
        }
        let result = blobs
            .retrieve(name)
            .map_err(anyhow::Error::from)
            .and_then(|blob| client.upload_image(name, &blob.bytes, blob.content_type));
        match result {
            Ok(stored) if stored == *name => {
                println!("  {}  {name}", "✎".green());
                uploaded += 1;
            }
            Ok(stored) => {
                println!("  {}  {name} → {stored}", "✎".green());
                uploaded += 1;
            }
            Err(e) => {
                eprintln!("  {}  {name}: {e:#}", "✗".red());
                failed += 1;
            }
        }
    }

    println!("{uploaded} uploaded, {skipped} skipped, {failed} failed");
    if failed > 0 {
        bail!("{failed} image(s) failed to upload");
    }
    println!("{} Remote images up to date", "✓".green());
    Ok(())
}

#[derive(Tabled)]
struct ImageRow {
    name: String,
    url: String,
}

fn images(mut client: AdminClient, volume_prefixes: &[PathBuf]) -> Result<()> {
    client
        .login()
        .with_context(|| format!("cannot log in to {}", client.base_url()))?;
    let listing = client.list_images().context("cannot list remote images")?;
    print_listing(&listing, volume_prefixes);
    Ok(())
}

fn print_listing(listing: &ImageListing, volume_prefixes: &[PathBuf]) {
    let unknown = || "not reported".dimmed().to_string();
    println!(
        "storage path: {}",
        listing.storage_path.clone().unwrap_or_else(unknown)
    );
    println!(
        "public base:  {}",
        listing.public_base.clone().unwrap_or_else(unknown)
    );

    if listing.images.is_empty() {
        println!("{} No images in the remote store", "!".yellow());
    } else {
        let rows = listing.images.iter().map(|image| ImageRow {
            name: image.name.clone(),
            url: image.url.clone().unwrap_or_default(),
        });
        println!("{}", Table::new(rows).with(Style::rounded()));
        println!("{} image(s)", listing.images.len());
    }

    match listing.storage_path.as_deref() {
        Some(path) if on_volume(path, volume_prefixes) => {
            println!("{} Images are stored on the volume", "✓".green());
        }
        Some(_) => println!(
            "{} Images may not be on the volume; uploads can vanish on redeploy",
            "!".yellow()
        ),
        None => println!("{} Could not determine the storage path", "!".yellow()),
    }
}

fn on_volume(storage_path: &str, volume_prefixes: &[PathBuf]) -> bool {
    let path = Path::new(storage_path);
    volume_prefixes.iter().any(|prefix| path.starts_with(prefix))
}
