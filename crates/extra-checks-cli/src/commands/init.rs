//! Init command implementation.

use anyhow::{bail, Context, Result};
use extra_checks::rules::Preset;
use std::path::Path;

const CONFIG_NAME: &str = "extra-checks.toml";

const HEADER: &str = r#"# extra-checks configuration
# Run `extra-checks list-checks` to see every check and its options.

# Level used for checks that do not set one
# level = "WARNING"

# Exit with status 1 when a diagnostic reaches this level
fail_level = "ERROR"

# Only check these applications (dotted package names)
# include_apps = ["shop"]

"#;

const PROJECT: &str = r#"

[project]
# Root directory to index (default: current directory)
# root = "."

# Glob patterns to exclude from indexing
exclude = [
    "**/migrations/**",
    "**/node_modules/**",
]

# Respect .gitignore files
respect_gitignore = true

# Installed applications; when unset every package with apps.py or
# models.py is one
# installed_apps = ["shop", "accounts"]
"#;

/// Renders the configuration file for a preset.
fn render(preset: Preset) -> String {
    format!("{HEADER}# Preset: {}\n{}{PROJECT}", preset.name(), preset.to_toml())
}

/// Runs the init command.
pub fn run(dir: &Path, force: bool, preset: Preset) -> Result<()> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, render(preset))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_NAME} ({} preset)", preset.name());
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure checks");
    println!("  2. Run: extra-checks check");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use extra_checks::{ConfigFile, Level, Settings};
    use tempfile::TempDir;

    #[test]
    fn generated_config_is_valid() {
        for &preset in Preset::ALL {
            let config = ConfigFile::parse(&render(preset)).unwrap();
            assert_eq!(config.fail_level, Some(Level::Error));
            let document = config.document.unwrap();
            let controller = extra_checks::rules::default_registry()
                .bind(&Settings::new(document), &extra_checks::IgnoreRegistry::new());
            assert!(controller.is_healthy(), "{} preset", preset.name());
        }
    }

    #[test]
    fn refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        run(tmp.path(), false, Preset::Minimal).unwrap();
        assert!(run(tmp.path(), false, Preset::Minimal).is_err());
        run(tmp.path(), true, Preset::Strict).unwrap();

        let written = std::fs::read_to_string(tmp.path().join(CONFIG_NAME)).unwrap();
        assert!(written.contains("# Preset: strict"));
    }
}
