//! Startup summary banner

use serde::Serialize;

use super::env::EnvLookup;
use crate::persona::CatalogStatus;

/// API keys reported in the summary (presence only)
const SUMMARY_KEYS: &[(&str, &str)] = &[
    ("OPENAI", "OPENAI_API_KEY"),
    ("CARTESIA", "CARTESIA_API_KEY"),
    ("DEEPGRAM", "DEEPGRAM_API_KEY"),
    ("MEETING_BAAS", "MEETING_BAAS_API_KEY"),
];

const PREVIEW_LEN: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct StartupSummary {
    pub mode: String,
    pub port: u16,
    pub persona_count: usize,
    pub persona_preview: String,
    pub api_keys: Vec<(String, bool)>,
    pub endpoint: String,
}

impl StartupSummary {
    pub fn gather<E: EnvLookup + ?Sized>(env: &E, personas: &CatalogStatus, port: u16, local_dev: bool) -> Self {
        let api_keys = SUMMARY_KEYS
            .iter()
            .map(|(label, var)| (label.to_string(), env.is_present(var)))
            .collect();

        let endpoint = if local_dev {
            "local tunnel".to_string()
        } else {
            match env.get("BASE_URL").filter(|url| !url.is_empty()) {
                Some(url) => format!("production: {}", url),
                None => "not configured".to_string(),
            }
        };

        Self {
            mode: if local_dev { "local-dev" } else { "production" }.to_string(),
            port,
            persona_count: personas.count,
            persona_preview: preview_names(&personas.names),
            api_keys,
            endpoint,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let api_status = self
            .api_keys
            .iter()
            .map(|(name, ok)| format!("{} [{}]", name, if *ok { "OK" } else { "MISSING" }))
            .collect::<Vec<_>>()
            .join(" ");

        vec![
            "=".repeat(50),
            "Speaking Meeting Bot Starting".to_string(),
            "=".repeat(50),
            format!("Mode: {}", self.mode),
            format!("Port: {}", self.port),
            format!("Personas: {} loaded ({})", self.persona_count, self.persona_preview),
            format!("Endpoint: {}", self.endpoint),
            format!("API Keys: {}", api_status),
            "=".repeat(50),
        ]
    }

    pub fn log(&self) {
        for line in self.lines() {
            log::info!("{}", line);
        }
    }
}

/// First few names, then a "+N more" tail
pub fn preview_names(names: &[String]) -> String {
    let mut preview = names.iter().take(PREVIEW_LEN).cloned().collect::<Vec<_>>().join(", ");
    if names.len() > PREVIEW_LEN {
        preview.push_str(&format!(", +{} more", names.len() - PREVIEW_LEN));
    }
    preview
}
