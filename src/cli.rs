use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

use pcat::persona::Gender;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "pcat",
    about = "Persona catalog and startup checks for the speaking meeting bot",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/pcat/logs/pcat.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to pcat.yaml config file")]
    pub config: Option<PathBuf>,

    /// Personas root directory (overrides config)
    #[arg(short, long, global = true)]
    pub personas: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List persona keys and display names
    List {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Resolve a persona by key or fuzzy name (random when omitted)
    Show {
        /// Key, display name or free-text words
        query: Option<String>,

        /// Seed for random selection
        #[arg(long)]
        seed: Option<u64>,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Find a persona by exact display name
    Find {
        /// Display name from the persona's title line
        name: String,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Create or update a persona; unset fields keep their stored values
    Edit {
        /// Persona key (directory name)
        key: String,

        /// Display name (required for new personas)
        #[arg(long)]
        name: Option<String>,

        /// Prompt paragraph (required for new personas)
        #[arg(long)]
        prompt: Option<String>,

        #[arg(long)]
        image: Option<String>,

        #[arg(long)]
        entry_message: Option<String>,

        #[arg(long)]
        voice_id: Option<String>,

        /// MALE or FEMALE (random for new personas when omitted)
        #[arg(long)]
        gender: Option<Gender>,

        /// Relevant link; repeat to add several (replaces stored links)
        #[arg(long = "link")]
        links: Vec<String>,
    },

    /// Manage persona images
    Image {
        #[command(subcommand)]
        action: ImageAction,
    },

    /// Rewrite every persona document with the standard template
    Save,

    /// Run startup validation and print the startup summary
    Validate {
        /// Skip API connectivity checks
        #[arg(long)]
        offline: bool,

        /// Report as local development mode
        #[arg(long)]
        local_dev: bool,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ImageAction {
    /// Show each persona's image URL
    List {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Point a persona at a new image URL or path
    Set {
        /// Persona key
        key: String,

        /// Image URL or path
        image: String,
    },

    /// List personas whose image is not on the image host yet
    Pending {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Get a specific config value
    Get {
        /// Config key (e.g., paths.personas)
        key: String,
    },
}
