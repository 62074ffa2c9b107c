use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by persona parsing and lookup
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Malformed persona document: {0}")]
    Malformed(String),

    #[error("No README.md in persona directory {}", .0.display())]
    MissingDocument(PathBuf),

    #[error("Persona '{query}' not found. Valid options: {}", .options.join(", "))]
    NotFound { query: String, options: Vec<String> },

    #[error("No personas loaded from {}", .0.display())]
    EmptyCatalog(PathBuf),

    #[error("Invalid persona key '{0}': must be a single directory name")]
    InvalidKey(String),

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersonaError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersonaError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PersonaError>;
