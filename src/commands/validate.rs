//! Startup validation command

use colored::*;
use eyre::Result;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use crate::cli::OutputFormat;
use pcat::config::Config;
use pcat::validation::connectivity::{ConnectivityCheck, HttpConnectivity};
use pcat::validation::env::{EnvLookup, ProcessEnv, validate_port};
use pcat::validation::summary::StartupSummary;
use pcat::validation::{self, ValidationReport};

pub struct ValidateArgs {
    pub offline: bool,
    pub local_dev: bool,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct ValidateOutput<'a> {
    report: &'a ValidationReport,
    summary: Option<&'a StartupSummary>,
}

pub fn run(root: &Path, args: ValidateArgs, config: &Config) -> Result<()> {
    let env = ProcessEnv;

    let http = HttpConnectivity::new(&env, Duration::from_secs(config.validation.timeout_secs));
    let checker = if args.offline || !config.validation.connectivity {
        None
    } else {
        Some(&http as &dyn ConnectivityCheck)
    };

    let report = validation::collect(&env, root, checker);
    let failure = report.failure();

    let summary = if failure.is_none() {
        let port = resolve_port(&env, config.server.default_port);
        let summary = StartupSummary::gather(&env, &report.personas, port, args.local_dev);
        summary.log();
        Some(summary)
    } else {
        None
    };

    match args.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&ValidateOutput {
                report: &report,
                summary: summary.as_ref(),
            })?
        ),
        OutputFormat::Yaml => println!(
            "{}",
            serde_yaml::to_string(&ValidateOutput {
                report: &report,
                summary: summary.as_ref(),
            })?
        ),
        OutputFormat::Text => print_text(&report, summary.as_ref(), args.offline),
    }

    report.ensure_passed()
}

fn resolve_port<E: EnvLookup + ?Sized>(env: &E, default: u16) -> u16 {
    match env.get("PORT") {
        Some(raw) => {
            let (port, warning) = validate_port(&raw, default);
            if let Some(warning) = warning {
                log::warn!("{}", warning);
                eprintln!("{} {}", "⚠".yellow(), warning);
            }
            port
        }
        None => default,
    }
}

fn print_text(report: &ValidationReport, summary: Option<&StartupSummary>, offline: bool) {
    println!("{}", "Startup Validation".bold());
    println!("{}", "═".repeat(50));
    println!();

    println!("{}", "Environment:".bold());
    if report.env_errors.is_empty() {
        println!("  {} Required API keys configured", "✓".green());
    } else {
        for error in &report.env_errors {
            println!("  {} {}", "✗".red(), error);
        }
    }
    println!();

    println!("{}", "Personas:".bold());
    if report.personas.valid {
        println!("  {} {} personas found", "✓".green(), report.personas.count);
    } else {
        println!("  {} No personas found", "✗".red());
        println!("    Each persona needs a folder with a README.md file.");
    }
    for key in &report.personas.skipped {
        println!("  {} {} skipped (see log for details)", "⚠".yellow(), key);
    }
    println!();

    println!("{}", "API Connectivity:".bold());
    if report.apis.is_empty() {
        let reason = if offline { "skipped (--offline)" } else { "not checked" };
        println!("  {} {}", "⚠".yellow(), reason);
    }
    for (service, ok) in &report.apis {
        if *ok {
            println!("  {} {}", "✓".green(), service);
        } else {
            println!("  {} {} (connection failed or invalid key)", "✗".red(), service);
        }
    }
    println!();

    match report.failure() {
        Some(failure) => {
            println!("{}", failure.headline().red().bold());
            for line in failure.details() {
                println!("{}", line);
            }
        }
        None => {
            if let Some(summary) = summary {
                for line in summary.lines() {
                    println!("{}", line);
                }
            }
        }
    }
}
