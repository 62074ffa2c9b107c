use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use pcat::config::Config;

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => get(&key, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        OutputFormat::Text => {
            println!("{}", "pcat Configuration".bold());
            println!();

            println!("{}: {}", "log_level".cyan(), config.log_level.as_filter());
            println!();

            println!("{}:", "paths".cyan());
            println!("  personas: {}", config.personas_dir().display());
            println!();

            println!("{}:", "images".cyan());
            println!("  host_domain: {}", config.images.host_domain);
            println!();

            println!("{}:", "server".cyan());
            println!("  default_port: {}", config.server.default_port);
            println!();

            println!("{}:", "validation".cyan());
            println!("  connectivity: {}", config.validation.connectivity);
            println!("  timeout_secs: {}", config.validation.timeout_secs);
        }
    }

    Ok(())
}

fn lookup(key: &str, config: &Config) -> Option<String> {
    match key {
        "paths.personas" => Some(config.personas_dir().display().to_string()),
        "images.host_domain" => Some(config.images.host_domain.clone()),
        "server.default_port" => Some(config.server.default_port.to_string()),
        "validation.connectivity" => Some(config.validation.connectivity.to_string()),
        "validation.timeout_secs" => Some(config.validation.timeout_secs.to_string()),
        "log_level" | "log-level" => Some(config.log_level.as_filter().to_string()),
        _ => None,
    }
}

fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(key, config) {
        Some(v) => println!("{}", v),
        None => eyre::bail!("Unknown config key: {}", key),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_keys() {
        let config = Config::default();
        assert_eq!(lookup("images.host_domain", &config).as_deref(), Some("uploadthing.com"));
        assert_eq!(lookup("log-level", &config).as_deref(), Some("info"));
        assert_eq!(lookup("server.default_port", &config).as_deref(), Some("7014"));
        assert!(lookup("paths.avatars", &config).is_none());
        assert!(lookup("server", &config).is_none());
    }
}
