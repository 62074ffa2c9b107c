//! Environment variable checks

use std::collections::HashMap;

/// Values starting with this prefix are copied-in placeholders from `.env.example`
pub const PLACEHOLDER_PREFIX: &str = "your_";

/// Variables that must be set, with what they are needed for
pub const REQUIRED_VARS: &[(&str, &str)] = &[
    ("MEETING_BAAS_API_KEY", "MeetingBaas API - required for bot creation"),
    ("OPENAI_API_KEY", "OpenAI API - required for LLM interactions"),
    ("CARTESIA_API_KEY", "Cartesia API - required for text-to-speech"),
];

/// Speech-to-text providers; at least one must be configured
pub const STT_VARS: &[&str] = &["DEEPGRAM_API_KEY", "GLADIA_API_KEY"];

/// Named string lookups, normally backed by the process environment
pub trait EnvLookup {
    fn get(&self, name: &str) -> Option<String>;

    /// Set to something other than an empty string or a placeholder
    fn configured(&self, name: &str) -> Option<String> {
        self.get(name)
            .filter(|value| !value.is_empty() && !value.starts_with(PLACEHOLDER_PREFIX))
    }

    fn is_configured(&self, name: &str) -> bool {
        self.configured(name).is_some()
    }

    /// Set and non-empty, placeholders included
    fn is_present(&self, name: &str) -> bool {
        self.get(name).map(|value| !value.is_empty()).unwrap_or(false)
    }
}

/// The real process environment
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Check required variables; returns one message per problem
pub fn validate_env_vars<E: EnvLookup + ?Sized>(env: &E) -> Vec<String> {
    let mut errors: Vec<String> = REQUIRED_VARS
        .iter()
        .filter(|(name, _)| !env.is_configured(name))
        .map(|(name, description)| format!("Missing {}: {}", name, description))
        .collect();

    if !STT_VARS.iter().any(|name| env.is_configured(name)) {
        errors.push(format!("Missing STT provider: Set {}", STT_VARS.join(" or ")));
    }

    errors
}

/// Parse a port number, falling back to `default` with a warning message
pub fn validate_port(raw: &str, default: u16) -> (u16, Option<String>) {
    match raw.trim().parse::<i64>() {
        Ok(port) if (1..=65535).contains(&port) => (port as u16, None),
        Ok(port) => (
            default,
            Some(format!("PORT {} out of range (1-65535), using default {}", port, default)),
        ),
        Err(_) => (
            default,
            Some(format!("Invalid PORT value '{}', using default {}", raw, default)),
        ),
    }
}
