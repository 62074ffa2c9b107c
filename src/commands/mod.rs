pub mod completions;
pub mod config;
pub mod image;
pub mod persona;
pub mod validate;

use colored::*;
use eyre::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

use pcat::config::Config;
use pcat::persona::catalog::Catalog;

/// Personas root: `--personas` flag, else the configured path
pub fn personas_root(cli_override: Option<&Path>, config: &Config) -> PathBuf {
    match cli_override {
        Some(path) => Config::expand_path(path),
        None => config.personas_dir(),
    }
}

/// Load the catalog and report skipped directories on stderr
///
/// A seed makes random persona picks repeatable.
pub fn open_catalog(root: &Path, seed: Option<u64>, quiet: bool) -> Result<Catalog> {
    let catalog = match seed {
        Some(seed) => Catalog::load_with_rng(root, StdRng::seed_from_u64(seed))?,
        None => Catalog::load(root)?,
    };

    if !quiet {
        for (key, err) in catalog.skipped() {
            eprintln!("{} Skipped persona {}: {}", "⚠".yellow(), key.bold(), err);
        }
    }

    Ok(catalog)
}
