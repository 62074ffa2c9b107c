//! API key connectivity checks
//!
//! Each configured key is exercised against a cheap authenticated endpoint.
//! Keys that are not configured report `false` without a request.

use indexmap::IndexMap;
use std::time::Duration;

use super::env::EnvLookup;

const OPENAI_MODELS_URL: &str = "https://api.openai.com/v1/models";
const CARTESIA_VOICES_URL: &str = "https://api.cartesia.ai/voices/";
const CARTESIA_VERSION: &str = "2024-06-10";
const DEEPGRAM_PROJECTS_URL: &str = "https://api.deepgram.com/v1/projects";

/// Something that can report per-service connectivity
pub trait ConnectivityCheck {
    /// Service name to reachable-with-valid-key
    fn check(&self) -> IndexMap<String, bool>;
}

/// Pings the real provider APIs over HTTP
pub struct HttpConnectivity<'a, E: EnvLookup + ?Sized> {
    env: &'a E,
    agent: ureq::Agent,
}

impl<'a, E: EnvLookup + ?Sized> HttpConnectivity<'a, E> {
    pub fn new(env: &'a E, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder().timeout_global(Some(timeout)).build();
        Self {
            env,
            agent: config.into(),
        }
    }

    fn ping(&self, service: &str, url: &str, headers: &[(&str, String)]) -> bool {
        let mut request = self.agent.get(url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        match request.call() {
            Ok(response) => response.status().as_u16() == 200,
            Err(e) => {
                log::debug!("{} connectivity check failed: {}", service, e);
                false
            }
        }
    }
}

impl<E: EnvLookup + ?Sized> ConnectivityCheck for HttpConnectivity<'_, E> {
    fn check(&self) -> IndexMap<String, bool> {
        let mut results = IndexMap::new();

        let openai = match self.env.configured("OPENAI_API_KEY") {
            Some(key) => self.ping(
                "openai",
                OPENAI_MODELS_URL,
                &[("Authorization", format!("Bearer {}", key))],
            ),
            None => false,
        };
        results.insert("openai".to_string(), openai);

        let cartesia = match self.env.configured("CARTESIA_API_KEY") {
            Some(key) => self.ping(
                "cartesia",
                CARTESIA_VOICES_URL,
                &[("X-API-Key", key), ("Cartesia-Version", CARTESIA_VERSION.to_string())],
            ),
            None => false,
        };
        results.insert("cartesia".to_string(), cartesia);

        match self.env.configured("DEEPGRAM_API_KEY") {
            Some(key) => {
                let ok = self.ping(
                    "deepgram",
                    DEEPGRAM_PROJECTS_URL,
                    &[("Authorization", format!("Token {}", key))],
                );
                results.insert("deepgram".to_string(), ok);
            }
            None => {
                // Gladia has no cheap auth endpoint; a configured key is trusted
                results.insert("stt_provider".to_string(), self.env.is_configured("GLADIA_API_KEY"));
            }
        }

        results
    }
}
