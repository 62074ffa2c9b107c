use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::persona::EditArgs;
use commands::validate::ValidateArgs;
use pcat::config::{Config, LogLevel};

fn open_log_file() -> Result<(fs::File, PathBuf)> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pcat")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("pcat.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .context("Failed to open log file")?;

    Ok((file, log_file))
}

fn setup_logging(log_level: &LogLevel) {
    // RUST_LOG env var takes precedence, otherwise use config log_level
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(match log_level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        });
    }

    // Fall back to stderr (warnings only) when the log file is unavailable
    let destination = match open_log_file() {
        Ok((file, path)) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            path.display().to_string()
        }
        Err(e) => {
            builder.filter_level(log::LevelFilter::Warn).target(env_logger::Target::Stderr);
            format!("stderr ({:#})", e)
        }
    };

    builder.init();

    info!("Logging initialized, writing to: {}", destination);
    info!(
        "Log level: {} (from {})",
        log_level.as_filter(),
        if std::env::var("RUST_LOG").is_ok() { "RUST_LOG env" } else { "config" }
    );
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let root = commands::personas_root(cli.personas.as_deref(), &config);
    let quiet = cli.quiet;
    if cli.verbose {
        eprintln!("Personas root: {}", root.display());
    }

    match cli.command {
        Commands::List { format } => commands::persona::list(&root, cli::OutputFormat::resolve(format), quiet),
        Commands::Show { query, seed, format } => {
            commands::persona::show(&root, query.as_deref(), seed, cli::OutputFormat::resolve(format), quiet)
        }
        Commands::Find { name, format } => {
            commands::persona::find(&root, &name, cli::OutputFormat::resolve(format), quiet)
        }
        Commands::Edit {
            key,
            name,
            prompt,
            image,
            entry_message,
            voice_id,
            gender,
            links,
        } => commands::persona::edit(
            &root,
            EditArgs {
                key,
                name,
                prompt,
                image,
                entry_message,
                voice_id,
                gender,
                links,
            },
            quiet,
        ),
        Commands::Image { action } => commands::image::run(action, &root, &config, quiet),
        Commands::Save => commands::persona::save_all(&root, quiet),
        Commands::Validate {
            offline,
            local_dev,
            format,
        } => commands::validate::run(
            &root,
            ValidateArgs {
                offline,
                local_dev,
                format: cli::OutputFormat::resolve(format),
            },
            &config,
        ),
        Commands::Config { action } => commands::config::run(action, &config),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // API keys and PORT may come from a .env file next to the bot
    let dotenv = dotenvy::dotenv();

    // Load configuration (before logging, so log messages in Config::load are silent)
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config.log_level);

    info!("Starting pcat with config from: {:?}", cli.config);
    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => info!("No .env loaded: {}", e),
    }

    run(cli, config).context("Command failed")?;

    Ok(())
}
