//! Persona catalog
//!
//! A persona is a named conversational profile: display name, prompt text,
//! voice settings, avatar and metadata. Each persona lives in its own
//! directory under the personas root:
//!
//! ```text
//! personas/
//! ├── tech_guru/
//! │   ├── README.md      (primary document)
//! │   └── background.md  (optional extra context)
//! └── friendly_coach/
//!     └── README.md
//! ```
//!
//! The directory name is the persona's key. The display name comes from the
//! document's title line and need not be unique.

pub mod catalog;
pub mod document;
pub mod error;
pub mod prompts;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Primary document filename inside each persona directory
pub const PRIMARY_DOCUMENT: &str = "README.md";

/// Hosting domain that already serves uploaded persona images
pub const DEFAULT_IMAGE_HOST: &str = "uploadthing.com";

/// Voice gender used for text-to-speech voice selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Pick a gender uniformly at random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) { Gender::Male } else { Gender::Female }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            _ => Err(format!("Unknown gender: {}", s)),
        }
    }
}

/// One persona as parsed from its primary document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaRecord {
    /// Display name from the document title
    pub name: String,

    /// Behavioral prompt (first paragraph after the title)
    pub prompt: String,

    /// Avatar URL or path
    #[serde(default)]
    pub image: String,

    /// Greeting spoken when the bot joins
    #[serde(default)]
    pub entry_message: String,

    /// Text-to-speech voice identifier
    #[serde(default, rename = "cartesia_voice_id")]
    pub voice_id: String,

    #[serde(default)]
    pub gender: Option<Gender>,

    #[serde(default)]
    pub relevant_links: Vec<String>,

    /// Sibling documents concatenated under generated headings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_content: Option<String>,
}

/// Partial update accepted by [`catalog::Catalog::save`]
///
/// `None` means "not set by the caller": the stored value (or a default)
/// is kept for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonaUpdate {
    pub name: String,
    pub prompt: String,
    pub image: Option<String>,
    pub entry_message: Option<String>,
    pub voice_id: Option<String>,
    pub gender: Option<Gender>,
    pub relevant_links: Option<Vec<String>>,
}

impl PersonaUpdate {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

impl From<&PersonaRecord> for PersonaUpdate {
    fn from(record: &PersonaRecord) -> Self {
        Self {
            name: record.name.clone(),
            prompt: record.prompt.clone(),
            image: Some(record.image.clone()),
            entry_message: Some(record.entry_message.clone()),
            voice_id: Some(record.voice_id.clone()),
            gender: record.gender,
            relevant_links: Some(record.relevant_links.clone()),
        }
    }
}

/// A persona returned by lookup, ready to hand to the bot pipeline
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPersona {
    /// Directory name the query resolved to
    pub key: String,

    /// Persona directory (personas root joined with key)
    pub path: PathBuf,

    /// Copy of the stored record, prompt carrying the interaction instructions
    #[serde(flatten)]
    pub persona: PersonaRecord,
}

/// Catalog validity as reported in the startup summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStatus {
    pub valid: bool,
    pub count: usize,
    pub names: Vec<String>,
    /// Directories that failed to load
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl CatalogStatus {
    pub fn from_names(names: Vec<String>) -> Self {
        Self {
            valid: !names.is_empty(),
            count: names.len(),
            names,
            skipped: Vec::new(),
        }
    }

    pub fn with_skipped(mut self, skipped: Vec<String>) -> Self {
        self.skipped = skipped;
        self
    }
}
