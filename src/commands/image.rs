//! Persona image commands
//!
//! Image uploading itself happens elsewhere; `pending` tells the uploader
//! which personas still point at an image outside the image host.

use colored::*;
use eyre::Result;
use indexmap::IndexMap;
use std::path::Path;

use crate::cli::{ImageAction, OutputFormat};
use pcat::config::Config;

use super::open_catalog;

pub fn run(action: ImageAction, root: &Path, config: &Config, quiet: bool) -> Result<()> {
    match action {
        ImageAction::List { format } => list(root, OutputFormat::resolve(format), quiet),
        ImageAction::Set { key, image } => set(root, &key, &image, quiet),
        ImageAction::Pending { format } => pending(root, &config.images.host_domain, OutputFormat::resolve(format), quiet),
    }
}

fn print_urls(urls: &IndexMap<String, String>, format: OutputFormat, title: &str) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(urls)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(urls)?),
        OutputFormat::Text => {
            println!("{}", title.bold());
            println!();
            if urls.is_empty() {
                println!("  {}", "(none)".dimmed());
            }
            for (key, url) in urls {
                let shown = if url.is_empty() { "(no image)".dimmed().to_string() } else { url.clone() };
                println!("  {} {}", key.cyan(), shown);
            }
        }
    }
    Ok(())
}

fn list(root: &Path, format: OutputFormat, quiet: bool) -> Result<()> {
    let catalog = open_catalog(root, None, quiet)?;
    print_urls(&catalog.image_urls(), format, "Persona Images:")
}

fn pending(root: &Path, domain: &str, format: OutputFormat, quiet: bool) -> Result<()> {
    let catalog = open_catalog(root, None, quiet)?;

    let pending: IndexMap<String, String> = catalog
        .image_urls()
        .into_iter()
        .filter(|(key, _)| catalog.needs_image_upload(key, domain))
        .collect();

    log::info!("{} personas need an image upload to {}", pending.len(), domain);
    print_urls(&pending, format, &format!("Images not hosted on {}:", domain))
}

fn set(root: &Path, key: &str, image: &str, quiet: bool) -> Result<()> {
    let mut catalog = open_catalog(root, None, quiet)?;

    if catalog.get(key).is_none() {
        eyre::bail!("Persona key '{}' not found. Valid options: {}", key, catalog.keys().join(", "));
    }
    if !catalog.update_image(key, image) {
        eyre::bail!("Failed to update image for {} (see log for details)", key);
    }

    if !quiet {
        println!("{} {} image set to {}", "✓".green(), key.bold(), image);
    }
    Ok(())
}
