//! extra-checks CLI tool.
//!
//! Usage:
//! ```bash
//! extra-checks check [OPTIONS] [PATH]
//! extra-checks list-checks
//! extra-checks init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use extra_checks::rules::Preset;
use extra_checks::{Level, Tag};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Static checks for Django models and Django REST framework serializers
#[derive(Parser)]
#[command(name = "extra-checks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run checks over a Django project
    Check {
        /// Project root (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run these groups (models, drf)
        #[arg(long, value_parser = parse_tag)]
        tag: Vec<Tag>,

        /// Only check models of these applications (name or label)
        #[arg(long)]
        app: Vec<String>,

        /// Apply available fixes in place
        #[arg(long)]
        fix: bool,

        /// Exit with status 1 when a diagnostic reaches this level
        #[arg(long, value_parser = parse_level)]
        fail_level: Option<Level>,
    },

    /// List available checks
    ListChecks {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,

        /// Checks to enable
        #[arg(long, default_value = "recommended", value_parser = parse_preset)]
        preset: Preset,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-diagnostic compact format.
    Compact,
}

fn parse_tag(value: &str) -> Result<Tag, String> {
    Tag::find(value).ok_or_else(|| {
        let names: Vec<&str> = Tag::ALL.iter().map(|t| t.name()).collect();
        format!("unknown group `{value}`, expected one of: {}", names.join(", "))
    })
}

fn parse_level(value: &str) -> Result<Level, String> {
    Level::parse(value)
        .ok_or_else(|| format!("unknown level `{value}`, expected one of: {}", Level::NAMES.join(", ")))
}

fn parse_preset(value: &str) -> Result<Preset, String> {
    Preset::find(value).ok_or_else(|| {
        let names: Vec<&str> = Preset::ALL.iter().map(|p| p.name()).collect();
        format!("unknown preset `{value}`, expected one of: {}", names.join(", "))
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            tag,
            app,
            fix,
            fail_level,
        } => {
            let options = commands::check::CheckOptions {
                format,
                tags: tag,
                apps: app,
                fix,
                fail_level,
            };
            if commands::check::run(&path, cli.config.as_deref(), &options)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::ListChecks { format } => commands::list_checks::run(format),
        Commands::Init { force, preset } => commands::init::run(std::path::Path::new("."), force, preset),
    }
}
