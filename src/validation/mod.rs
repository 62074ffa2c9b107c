//! Startup validation
//!
//! Checks that the bot can start: required API keys are set, the personas
//! directory has at least one persona, and the configured keys actually work.

pub mod connectivity;
pub mod env;
pub mod summary;

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;

use crate::persona::CatalogStatus;
use crate::persona::catalog::Catalog;
use connectivity::ConnectivityCheck;
use env::{EnvLookup, validate_env_vars};

/// Load the catalog and report what it holds
///
/// Directories the catalog skips are not counted. An unreadable root is an
/// empty catalog.
pub fn validate_personas(root: &Path) -> CatalogStatus {
    match Catalog::load(root) {
        Ok(catalog) => catalog.status(),
        Err(e) => {
            log::warn!("Cannot load personas from {}: {:#}", root.display(), e);
            CatalogStatus::from_names(Vec::new())
        }
    }
}

/// Why startup validation failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFailure {
    MissingConfiguration { errors: Vec<String> },
    NoPersonas,
    ApiConnectivity { services: Vec<String> },
}

impl ValidationFailure {
    pub fn headline(&self) -> &'static str {
        match self {
            ValidationFailure::MissingConfiguration { .. } => "STARTUP FAILED: Missing required configuration",
            ValidationFailure::NoPersonas => "STARTUP FAILED: No personas found",
            ValidationFailure::ApiConnectivity { .. } => "STARTUP FAILED: API connectivity check failed",
        }
    }

    /// Detail lines shown under the headline
    pub fn details(&self) -> Vec<String> {
        match self {
            ValidationFailure::MissingConfiguration { errors } => {
                let mut lines: Vec<String> = errors.iter().map(|e| format!("  - {}", e)).collect();
                lines.push(String::new());
                lines.push("Please check your .env file and ensure all required".to_string());
                lines.push("API keys are set. See .env.example for reference.".to_string());
                lines
            }
            ValidationFailure::NoPersonas => vec![
                "The personas directory is empty or missing.".to_string(),
                "Each persona needs a folder with a README.md file.".to_string(),
            ],
            ValidationFailure::ApiConnectivity { services } => {
                let mut lines: Vec<String> = services
                    .iter()
                    .map(|s| format!("  - {} API: Connection failed or invalid key", s.to_uppercase()))
                    .collect();
                lines.push(String::new());
                lines.push("Please verify your API keys are correct and the".to_string());
                lines.push("services are reachable from this network.".to_string());
                lines
            }
        }
    }

    fn log(&self) {
        log::error!("{}", "=".repeat(50));
        log::error!("{}", self.headline());
        log::error!("{}", "=".repeat(50));
        for line in self.details() {
            log::error!("{}", line);
        }
        log::error!("{}", "=".repeat(50));
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationFailure::MissingConfiguration { errors } => write!(f, "{}", errors.join("; ")),
            ValidationFailure::NoPersonas => write!(f, "no personas found"),
            ValidationFailure::ApiConnectivity { services } => {
                write!(f, "API connectivity failed for {}", services.join(", "))
            }
        }
    }
}

/// Everything the startup checks found
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub checked_at: DateTime<Local>,
    pub env_errors: Vec<String>,
    pub personas: CatalogStatus,
    pub apis: IndexMap<String, bool>,
}

impl ValidationReport {
    /// First failing check, in the order the bot would hit them
    pub fn failure(&self) -> Option<ValidationFailure> {
        if !self.env_errors.is_empty() {
            return Some(ValidationFailure::MissingConfiguration {
                errors: self.env_errors.clone(),
            });
        }
        if !self.personas.valid {
            return Some(ValidationFailure::NoPersonas);
        }
        let services: Vec<String> = self
            .apis
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(name, _)| name.clone())
            .collect();
        if !services.is_empty() {
            return Some(ValidationFailure::ApiConnectivity { services });
        }
        None
    }

    /// Log the failure banner and fail if any check did not pass
    pub fn ensure_passed(&self) -> eyre::Result<()> {
        if let Some(failure) = self.failure() {
            failure.log();
            eyre::bail!("{}: {}", failure.headline(), failure);
        }

        log::info!("Validation passed: {} personas loaded", self.personas.count);
        Ok(())
    }
}

/// Run every check without stopping at the first failure
///
/// Connectivity is only attempted when the environment is complete and a
/// checker is supplied.
pub fn collect<E: EnvLookup + ?Sized>(
    env: &E,
    personas_root: &Path,
    checker: Option<&dyn ConnectivityCheck>,
) -> ValidationReport {
    log::info!("Running startup validation...");

    let env_errors = validate_env_vars(env);
    let personas = validate_personas(personas_root);
    let apis = match checker {
        Some(checker) if env_errors.is_empty() => checker.check(),
        _ => IndexMap::new(),
    };

    ValidationReport {
        checked_at: Local::now(),
        env_errors,
        personas,
        apis,
    }
}

/// Run startup validation, failing with the first problem found
pub fn run_startup_validation<E: EnvLookup + ?Sized>(
    env: &E,
    personas_root: &Path,
    checker: Option<&dyn ConnectivityCheck>,
) -> eyre::Result<ValidationReport> {
    let report = collect(env, personas_root, checker);
    report.ensure_passed()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PRIMARY_DOCUMENT;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    struct FixedConnectivity(Vec<(&'static str, bool)>);

    impl ConnectivityCheck for FixedConnectivity {
        fn check(&self) -> IndexMap<String, bool> {
            self.0.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        }
    }

    fn complete_env() -> HashMap<String, String> {
        [
            ("MEETING_BAAS_API_KEY", "mb-1"),
            ("OPENAI_API_KEY", "sk-1"),
            ("CARTESIA_API_KEY", "ca-1"),
            ("DEEPGRAM_API_KEY", "dg-1"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn personas_root() -> TempDir {
        let temp = TempDir::new().unwrap();
        for key in ["tech_guru", "friendly_coach"] {
            let dir = temp.path().join(key);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(PRIMARY_DOCUMENT), "# X\n\nY\n").unwrap();
        }
        fs::create_dir_all(temp.path().join("no_readme")).unwrap();
        let untitled = temp.path().join("untitled");
        fs::create_dir_all(&untitled).unwrap();
        fs::write(untitled.join(PRIMARY_DOCUMENT), "# Only A Title\n## Metadata\n- gender: MALE\n").unwrap();
        temp
    }

    #[test]
    fn test_validate_personas_counts_loaded_personas() {
        let temp = personas_root();
        let status = validate_personas(temp.path());
        assert!(status.valid);
        assert_eq!(status.count, 2);
        assert_eq!(status.names, vec!["friendly_coach", "tech_guru"]);
        assert_eq!(status.skipped, vec!["no_readme", "untitled"]);
    }

    #[test]
    fn test_validate_personas_only_malformed_is_invalid() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(PRIMARY_DOCUMENT), "# Broken\n").unwrap();

        let status = validate_personas(temp.path());

        assert!(!status.valid);
        assert_eq!(status.count, 0);
        assert_eq!(status.skipped, vec!["broken"]);
    }

    #[test]
    fn test_validate_personas_missing_root() {
        let temp = TempDir::new().unwrap();
        let status = validate_personas(&temp.path().join("nope"));
        assert!(!status.valid);
        assert_eq!(status.count, 0);
    }

    #[test]
    fn test_startup_validation_passes() {
        let temp = personas_root();
        let checker = FixedConnectivity(vec![("openai", true), ("cartesia", true), ("deepgram", true)]);

        let report = run_startup_validation(&complete_env(), temp.path(), Some(&checker)).unwrap();

        assert_eq!(report.personas.count, 2);
        assert_eq!(report.apis.len(), 3);
    }

    #[test]
    fn test_missing_env_skips_connectivity() {
        let temp = personas_root();
        let mut env = complete_env();
        env.remove("OPENAI_API_KEY");
        let checker = FixedConnectivity(vec![("openai", false)]);

        let report = collect(&env, temp.path(), Some(&checker));

        assert!(report.apis.is_empty());
        assert!(matches!(
            report.failure(),
            Some(ValidationFailure::MissingConfiguration { .. })
        ));
    }

    #[test]
    fn test_no_personas_fails() {
        let temp = TempDir::new().unwrap();
        let result = run_startup_validation(&complete_env(), temp.path(), None);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("No personas found"));
    }

    #[test]
    fn test_failed_api_is_reported() {
        let temp = personas_root();
        let checker = FixedConnectivity(vec![("openai", true), ("cartesia", false)]);

        let report = collect(&complete_env(), temp.path(), Some(&checker));

        assert_eq!(
            report.failure(),
            Some(ValidationFailure::ApiConnectivity {
                services: vec!["cartesia".to_string()]
            })
        );
        let details = report.failure().unwrap().details();
        assert_eq!(details[0], "  - CARTESIA API: Connection failed or invalid key");
    }

    #[test]
    fn test_offline_validation_has_no_api_results() {
        let temp = personas_root();
        let report = run_startup_validation(&complete_env(), temp.path(), None).unwrap();
        assert!(report.apis.is_empty());
        assert!(report.failure().is_none());
    }
}
