//! Check command implementation.

use anyhow::{Context, Result};
use extra_checks::{apply_replacements, Level, Report, Runner, Tag};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config_resolver;
use crate::OutputFormat;

/// Upper bound on fix-and-recheck rounds of `--fix`.
const MAX_FIX_ROUNDS: usize = 10;

/// Command line options of `check`.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Groups to run; empty runs all.
    pub tags: Vec<Tag>,
    /// Applications to restrict model checks to; empty checks all.
    pub apps: Vec<String>,
    /// Whether to apply fixes in place.
    pub fix: bool,
    /// Exit threshold overriding the config file.
    pub fail_level: Option<Level>,
}

/// Runs the check command.
///
/// `config` is the `--config` flag. Returns true when a diagnostic
/// reaches the fail level.
pub fn run(path: &Path, config: Option<&Path>, options: &CheckOptions) -> Result<bool> {
    let resolved = config_resolver::resolve(path, config)?;
    tracing::info!("Using configuration from {}", resolved.origin);
    let config = resolved.config;
    let fail_level = options.fail_level.or(config.fail_level).unwrap_or(Level::Error);

    let mut runner = Runner::from_config(&config).tags(options.tags.iter().copied());
    if !options.apps.is_empty() {
        runner = runner.apps(options.apps.iter().cloned());
    }

    tracing::info!("Checking {}", runner.project_config().root.display());
    let (mut project, mut report) = runner.check().context("Failed to index project")?;

    if options.fix {
        // Some fixes only become available once earlier ones are applied.
        // Rounds continue while they remove diagnostics.
        let mut fixed = BTreeSet::new();
        for _ in 0..MAX_FIX_ROUNDS {
            let files = apply_fixes(&report)?;
            if files.is_empty() {
                break;
            }
            fixed.extend(files);
            let before = report.diagnostics.len();
            (project, report) = runner.check().context("Failed to index project")?;
            if report.diagnostics.len() >= before {
                break;
            }
        }
        if !fixed.is_empty() {
            eprintln!("Fixed {} file(s)", fixed.len());
        }
    }

    super::output::print(&report, options.format, &project)?;

    Ok(report.has_at_least(fail_level))
}

/// Rewrites every file that has fixes, once per file, and returns them.
fn apply_fixes(report: &Report) -> Result<Vec<PathBuf>> {
    let files = report.fixes_by_file();
    for (file, replacements) in &files {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let fixed = apply_replacements(&content, replacements.iter().copied());
        std::fs::write(file, fixed).with_context(|| format!("Failed to write {}", file.display()))?;
        tracing::debug!("Applied {} fix(es) to {}", replacements.len(), file.display());
    }
    Ok(files.into_keys().map(Path::to_path_buf).collect())
}
