//! Persona catalog commands

use colored::*;
use eyre::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::cli::OutputFormat;
use pcat::persona::catalog::Catalog;
use pcat::persona::{Gender, PersonaRecord, PersonaUpdate};

use super::open_catalog;

pub fn list(root: &Path, format: OutputFormat, quiet: bool) -> Result<()> {
    let catalog = open_catalog(root, None, quiet)?;

    #[derive(Serialize)]
    struct PersonaSummary<'a> {
        key: &'a str,
        name: &'a str,
        gender: Option<Gender>,
        has_image: bool,
    }

    let summaries: Vec<PersonaSummary> = catalog
        .iter()
        .map(|(key, p)| PersonaSummary {
            key,
            name: &p.name,
            gender: p.gender,
            has_image: !p.image.is_empty(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&summaries)?),
        OutputFormat::Text => {
            println!("{}", "Available Personas:".bold());
            println!();

            if summaries.is_empty() {
                println!("  {} No personas found in {}", "(none)".dimmed(), root.display());
                println!();
                println!("  Create one with: {}", "pcat edit <key> --name <name> --prompt <prompt>".cyan());
            } else {
                for summary in &summaries {
                    println!("  {} {} {}", "●".green(), summary.key.bold(), summary.name.dimmed());
                }
                println!();
                println!("{} personas", summaries.len());
            }
        }
    }

    Ok(())
}

pub fn show(root: &Path, query: Option<&str>, seed: Option<u64>, format: OutputFormat, quiet: bool) -> Result<()> {
    let mut catalog = open_catalog(root, seed, quiet)?;

    let resolved = catalog.resolve(query)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&resolved)?),
        OutputFormat::Text => {
            println!("{} {} ({})", "Persona:".bold(), resolved.persona.name.green().bold(), resolved.key);
            println!("{} {}", "Path:".bold(), resolved.path.display());
            print_record(&resolved.persona);
        }
    }

    Ok(())
}

pub fn find(root: &Path, name: &str, format: OutputFormat, quiet: bool) -> Result<()> {
    let catalog = open_catalog(root, None, quiet)?;
    let persona = catalog.find_by_display_name(name)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&persona)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&persona)?),
        OutputFormat::Text => {
            println!("{} {}", "Persona:".bold(), persona.name.green().bold());
            print_record(&persona);
        }
    }

    Ok(())
}

fn print_record(persona: &PersonaRecord) {
    println!();
    println!("{}", "Prompt:".bold());
    for line in persona.prompt.lines() {
        println!("  {}", line);
    }
    println!();

    let gender = persona.gender.map(|g| g.to_string()).unwrap_or_default();
    for (label, value) in [
        ("Image", persona.image.as_str()),
        ("Entry message", persona.entry_message.as_str()),
        ("Voice", persona.voice_id.as_str()),
        ("Gender", gender.as_str()),
    ] {
        let shown = if value.is_empty() { "(unset)".dimmed().to_string() } else { value.to_string() };
        println!("{} {}", format!("{}:", label).bold(), shown);
    }

    if !persona.relevant_links.is_empty() {
        println!("{}", "Links:".bold());
        for link in &persona.relevant_links {
            println!("  {} {}", "•".cyan(), link);
        }
    }

    if let Some(ref extra) = persona.additional_content {
        println!();
        println!("{} {} characters", "Additional content:".bold(), extra.len());
    }
}

/// Fields for `pcat edit`
pub struct EditArgs {
    pub key: String,
    pub name: Option<String>,
    pub prompt: Option<String>,
    pub image: Option<String>,
    pub entry_message: Option<String>,
    pub voice_id: Option<String>,
    pub gender: Option<Gender>,
    pub links: Vec<String>,
}

impl EditArgs {
    /// Build the update, taking name and prompt from the stored record when omitted
    fn into_update(self, existing: Option<&PersonaRecord>) -> Result<PersonaUpdate> {
        let name = self
            .name
            .or_else(|| existing.map(|p| p.name.clone()))
            .ok_or_else(|| eyre::eyre!("New persona '{}' needs --name", self.key))?;
        let prompt = self
            .prompt
            .or_else(|| existing.map(|p| p.prompt.clone()))
            .ok_or_else(|| eyre::eyre!("New persona '{}' needs --prompt", self.key))?;

        Ok(PersonaUpdate {
            name,
            prompt,
            image: self.image,
            entry_message: self.entry_message,
            voice_id: self.voice_id,
            gender: self.gender,
            relevant_links: if self.links.is_empty() { None } else { Some(self.links) },
        })
    }
}

pub fn edit(root: &Path, args: EditArgs, quiet: bool) -> Result<()> {
    fs::create_dir_all(root).with_context(|| format!("Failed to create personas directory: {}", root.display()))?;

    let mut catalog = open_catalog(root, None, quiet)?;
    let key = args.key.clone();
    let is_new = catalog.get(&key).is_none();
    let update = args.into_update(catalog.get(&key))?;
    Catalog::check_update(&key, &update)?;

    if !catalog.save(&key, &update) {
        eyre::bail!("Failed to save persona {} (see log for details)", key);
    }

    if !quiet {
        let verb = if is_new { "Created" } else { "Updated" };
        println!("{} {} persona {}", "✓".green(), verb, key.bold());
    }

    Ok(())
}

pub fn save_all(root: &Path, quiet: bool) -> Result<()> {
    let mut catalog = open_catalog(root, None, quiet)?;

    if !catalog.save_all() {
        eyre::bail!("Some personas failed to save (see log for details)");
    }

    if !quiet {
        println!("{} Saved {} personas", "✓".green(), catalog.len());
    }

    Ok(())
}
