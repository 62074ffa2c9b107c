//! Persona catalog loading, lookup and persistence

use eyre::{Context, Result};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::document;
use super::error::{self, PersonaError};
use super::prompts::{DEFAULT_ENTRY_MESSAGE, PERSONA_INTERACTION_INSTRUCTIONS};
use super::{CatalogStatus, Gender, PRIMARY_DOCUMENT, PersonaRecord, PersonaUpdate, ResolvedPersona};

/// In-memory persona catalog keyed by directory name
///
/// Entries are kept in sorted key order. Fuzzy lookup ties and display-name
/// duplicates both resolve to the first key in that order.
pub struct Catalog {
    root: PathBuf,
    personas: IndexMap<String, PersonaRecord>,
    skipped: Vec<(String, PersonaError)>,
    rng: StdRng,
}

impl Catalog {
    /// Load every persona under `root`
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        Self::load_with_rng(root, StdRng::from_entropy())
    }

    /// Load every persona under `root`, drawing random choices from `rng`
    ///
    /// Directories that cannot be loaded are skipped and reported through
    /// [`Catalog::skipped`]. Only failure to read `root` itself is an error.
    pub fn load_with_rng(root: impl Into<PathBuf>, rng: StdRng) -> Result<Self> {
        let root = root.into();

        let entries = fs::read_dir(&root)
            .with_context(|| format!("Failed to read personas directory: {}", root.display()))?;

        let mut dirs: Vec<(String, PathBuf)> = readable(&root, entries)
            .filter(|entry| entry.path().is_dir())
            .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
            .filter(|(key, _)| !key.starts_with('.'))
            .collect();
        dirs.sort();

        let (personas, skipped) = dirs.into_iter().fold(
            (IndexMap::new(), Vec::new()),
            |(mut personas, mut skipped), (key, path)| {
                match load_persona(&path) {
                    Ok(record) => {
                        log::debug!("Loaded persona {} ({})", key, record.name);
                        personas.insert(key, record);
                    }
                    Err(e) => {
                        log::warn!("Skipping persona {}: {}", key, e);
                        skipped.push((key, e));
                    }
                }
                (personas, skipped)
            },
        );

        log::info!(
            "Loaded {} personas from {} ({} skipped)",
            personas.len(),
            root.display(),
            skipped.len()
        );

        Ok(Self {
            root,
            personas,
            skipped,
            rng,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&PersonaRecord> {
        self.personas.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PersonaRecord)> {
        self.personas.iter()
    }

    /// Directories skipped during load, with the reason
    pub fn skipped(&self) -> &[(String, PersonaError)] {
        &self.skipped
    }

    /// All persona keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.personas.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn status(&self) -> CatalogStatus {
        let skipped = self.skipped.iter().map(|(key, _)| key.clone()).collect();
        CatalogStatus::from_names(self.keys()).with_skipped(skipped)
    }

    /// Map of persona key to image URL
    pub fn image_urls(&self) -> IndexMap<String, String> {
        self.personas
            .iter()
            .map(|(key, persona)| (key.clone(), persona.image.clone()))
            .collect()
    }

    /// Whether the persona's image still has to be uploaded to `domain`
    ///
    /// Unknown keys never need an upload.
    pub fn needs_image_upload(&self, key: &str, domain: &str) -> bool {
        match self.personas.get(key) {
            Some(persona) => persona.image.is_empty() || !persona.image.contains(domain),
            None => false,
        }
    }

    /// Resolve a free-text query to a persona
    ///
    /// No query picks a random persona. Otherwise the query is tried as a key
    /// (lowercased, spaces to underscores), then matched by the number of
    /// words it shares with each key.
    pub fn resolve(&mut self, query: Option<&str>) -> error::Result<ResolvedPersona> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let (key, mut persona) = match query {
            Some(query) => self.match_query(query).map(|(k, p)| (k.clone(), p.clone()))?,
            None => self.pick_random().map(|(k, p)| (k.clone(), p.clone()))?,
        };
        persona.prompt.push_str(PERSONA_INTERACTION_INSTRUCTIONS);

        Ok(ResolvedPersona {
            path: self.root.join(&key),
            key,
            persona,
        })
    }

    fn pick_random(&mut self) -> error::Result<(&String, &PersonaRecord)> {
        if self.personas.is_empty() {
            return Err(PersonaError::EmptyCatalog(self.root.clone()));
        }
        let index = self.rng.gen_range(0..self.personas.len());
        let (key, persona) = self
            .personas
            .get_index(index)
            .ok_or_else(|| PersonaError::EmptyCatalog(self.root.clone()))?;
        log::info!("Randomly selected persona: {}", persona.name);
        Ok((key, persona))
    }

    fn match_query(&self, query: &str) -> error::Result<(&String, &PersonaRecord)> {
        let candidate = query.to_lowercase().replace(' ', "_");
        if let Some(entry) = self.personas.get_key_value(&candidate) {
            log::info!("Using specified persona folder: {}", candidate);
            return Ok(entry);
        }

        let words: HashSet<String> = query.to_lowercase().split_whitespace().map(str::to_string).collect();

        let mut best = None;
        let mut max_overlap = 0;
        for (key, persona) in &self.personas {
            let key_words: HashSet<&str> = key.split('_').collect();
            let overlap = key_words.iter().filter(|w| words.contains(**w)).count();
            if overlap > max_overlap {
                max_overlap = overlap;
                best = Some((key, persona));
            }
        }

        match best {
            Some((key, persona)) => {
                log::warn!("Using closest matching persona folder: {} (from: {})", key, query);
                Ok((key, persona))
            }
            None => Err(PersonaError::NotFound {
                query: query.to_string(),
                options: self.personas.keys().cloned().collect(),
            }),
        }
    }

    /// Find a persona by exact display name
    pub fn find_by_display_name(&self, name: &str) -> error::Result<PersonaRecord> {
        self.personas
            .values()
            .find(|persona| persona.name == name)
            .cloned()
            .ok_or_else(|| PersonaError::NotFound {
                query: name.to_string(),
                options: self.personas.values().map(|p| p.name.clone()).collect(),
            })
    }

    /// Write one persona's document, merging with what is already on disk
    ///
    /// Returns false after logging on any failure.
    pub fn save(&mut self, key: &str, update: &PersonaUpdate) -> bool {
        match self.write_persona(key, update) {
            Ok(mut record) => {
                match self.personas.get_mut(key) {
                    Some(existing) => {
                        record.additional_content = existing.additional_content.take();
                        *existing = record;
                    }
                    None => {
                        self.personas.insert(key.to_string(), record);
                        self.personas.sort_keys();
                    }
                }
                true
            }
            Err(e) => {
                log::error!("Failed to save persona {}: {}", key, e);
                false
            }
        }
    }

    /// Save every persona; keeps going past failures
    pub fn save_all(&mut self) -> bool {
        let updates: Vec<(String, PersonaUpdate)> = self
            .personas
            .iter()
            .map(|(key, persona)| (key.clone(), PersonaUpdate::from(persona)))
            .collect();

        let mut success = true;
        for (key, update) in updates {
            if !self.save(&key, &update) {
                success = false;
            }
        }
        success
    }

    /// Point a persona at a new image and persist it
    pub fn update_image(&mut self, key: &str, image: &str) -> bool {
        let Some(persona) = self.personas.get_mut(key) else {
            log::error!("Persona key '{}' not found", key);
            return false;
        };
        persona.image = image.to_string();
        let update = PersonaUpdate::from(&*persona);
        self.save(key, &update)
    }

    /// Check that `update` can be written under `key` and read back unchanged
    pub fn check_update(key: &str, update: &PersonaUpdate) -> error::Result<()> {
        if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\']) {
            return Err(PersonaError::InvalidKey(key.to_string()));
        }

        let name = update.name.trim();
        let prompt = normalize_prompt(&update.prompt);
        if name.is_empty() || prompt.is_empty() {
            return Err(PersonaError::Malformed(format!("'{}' needs both a name and a prompt", key)));
        }
        if name.contains(['\n', '\r']) || name.starts_with("# ") {
            return Err(PersonaError::Malformed(format!("name of '{}' must be a single title line", key)));
        }
        if format!("\n{}", prompt).contains(document::SECTION_DELIMITER) {
            return Err(PersonaError::Malformed(format!(
                "prompt of '{}' must not contain a line starting with '## '",
                key
            )));
        }
        Ok(())
    }

    fn write_persona(&mut self, key: &str, update: &PersonaUpdate) -> error::Result<PersonaRecord> {
        Self::check_update(key, update)?;

        let dir = self.root.join(key);
        fs::create_dir_all(&dir).map_err(|e| PersonaError::io(&dir, e))?;

        let readme = dir.join(PRIMARY_DOCUMENT);
        let existing = read_existing(&readme)?;
        let record = merge(update, existing.as_ref(), &mut self.rng);

        fs::write(&readme, document::render(&record)).map_err(|e| PersonaError::io(&readme, e))?;
        log::info!("Saved persona {} to {}", key, readme.display());

        Ok(record)
    }
}

/// Drop directory entries that could not be read, logging each one
fn readable<T>(root: &Path, entries: impl Iterator<Item = std::io::Result<T>>) -> impl Iterator<Item = T> {
    entries.filter_map(move |entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            log::warn!("Skipping unreadable entry in {}: {}", root.display(), e);
            None
        }
    })
}

fn normalize_prompt(prompt: &str) -> String {
    prompt.replace("\r\n", "\n").trim().to_string()
}

fn load_persona(dir: &Path) -> error::Result<PersonaRecord> {
    let readme = dir.join(PRIMARY_DOCUMENT);
    if !readme.is_file() {
        return Err(PersonaError::MissingDocument(dir.to_path_buf()));
    }

    let content = fs::read_to_string(&readme).map_err(|e| PersonaError::io(&readme, e))?;
    let mut record = document::parse(&content)?;
    record.additional_content = load_additional_content(dir);
    Ok(record)
}

/// Concatenate sibling markdown documents, in filename order
fn load_additional_content(dir: &Path) -> Option<String> {
    let blocks: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                log::debug!("Error walking {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_additional_document(entry.path()))
        .filter_map(|entry| {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            match fs::read_to_string(entry.path()) {
                Ok(content) if !content.trim().is_empty() => {
                    Some(format!("# Content from {}\n\n{}", file_name, content.trim()))
                }
                Ok(_) => None,
                Err(e) => {
                    log::error!("Error loading additional content from {}: {}", entry.path().display(), e);
                    None
                }
            }
        })
        .collect();

    if blocks.is_empty() { None } else { Some(blocks.join("\n\n")) }
}

fn is_additional_document(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    name != PRIMARY_DOCUMENT && !name.starts_with('.') && path.extension().map(|e| e == "md").unwrap_or(false)
}

/// Parse the document already on disk, if any
///
/// A document that no longer parses contributes nothing to the merge.
fn read_existing(readme: &Path) -> error::Result<Option<PersonaRecord>> {
    if !readme.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(readme).map_err(|e| PersonaError::io(readme, e))?;
    match document::parse(&content) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            log::warn!("Overwriting unparseable document {}: {}", readme.display(), e);
            Ok(None)
        }
    }
}

/// Caller value, then stored value, then default
fn merge<R: Rng + ?Sized>(update: &PersonaUpdate, existing: Option<&PersonaRecord>, rng: &mut R) -> PersonaRecord {
    let image = update
        .image
        .clone()
        .or_else(|| existing.map(|e| e.image.clone()))
        .unwrap_or_default();

    let entry_message = update
        .entry_message
        .clone()
        .or_else(|| existing.map(|e| e.entry_message.clone()).filter(|m| !m.is_empty()))
        .unwrap_or_else(|| DEFAULT_ENTRY_MESSAGE.to_string());

    let voice_id = update
        .voice_id
        .clone()
        .or_else(|| existing.map(|e| e.voice_id.clone()))
        .unwrap_or_default();

    let gender = update
        .gender
        .or_else(|| existing.and_then(|e| e.gender))
        .unwrap_or_else(|| Gender::random(rng));

    let relevant_links = update
        .relevant_links
        .clone()
        .or_else(|| existing.map(|e| e.relevant_links.clone()))
        .unwrap_or_default();

    PersonaRecord {
        name: update.name.trim().to_string(),
        prompt: normalize_prompt(&update.prompt),
        image,
        entry_message,
        voice_id,
        gender: Some(gender),
        relevant_links,
        additional_content: None,
    }
}
