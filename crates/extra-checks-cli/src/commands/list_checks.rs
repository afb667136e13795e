//! List checks command implementation.

use anyhow::Result;
use extra_checks::rules::{catalogue, Preset};
use extra_checks::{CatalogueEntry, CheckSettings};
use serde::Serialize;
use std::fmt::Write;

use crate::OutputFormat;

/// One catalogue row.
#[derive(Debug, Serialize)]
struct CheckRow {
    code: &'static str,
    name: &'static str,
    summary: &'static str,
    groups: Vec<&'static str>,
    level: String,
    options: Vec<String>,
    deprecated: bool,
}

impl CheckRow {
    fn new(entry: &CatalogueEntry) -> Self {
        let built = (entry.build)(&CheckSettings::default());
        let check = built.check();
        Self {
            code: entry.id.code(),
            name: entry.id.name(),
            summary: entry.id.summary(),
            groups: entry.tags.iter().map(|t| t.name()).collect(),
            level: check.default_level().as_str().to_owned(),
            options: (entry.schema)().keys().map(ToOwned::to_owned).collect(),
            deprecated: check.deprecation().is_some(),
        }
    }
}

/// Runs the list-checks command.
pub fn run(format: OutputFormat) -> Result<()> {
    let rows: Vec<CheckRow> = catalogue().iter().map(CheckRow::new).collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Available checks:\n");
    println!("{:<6} {:<36} {:<28} Description", "Code", "Name", "Group");
    println!("{}", "-".repeat(110));

    for row in &rows {
        let mut description = row.summary.to_owned();
        if !row.options.is_empty() {
            let _ = write!(description, " (options: {})", row.options.join(", "));
        }
        if row.deprecated {
            description.push_str(" [deprecated]");
        }
        println!(
            "{:<6} {:<36} {:<28} {}",
            row.code,
            row.name,
            row.groups.join(","),
            description
        );
    }

    println!("\nPresets:");
    for preset in Preset::ALL {
        println!("  {:<12} - {} checks", preset.name(), preset.checks().len());
    }

    println!("\nEnable checks in extra-checks.toml, e.g.:");
    println!("  checks = [\"field-null\", {{ id = \"model-attribute\", attrs = [\"site\"] }}]");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_describe_the_catalogue() {
        let rows: Vec<CheckRow> = catalogue().iter().map(CheckRow::new).collect();
        let upload = rows.iter().find(|r| r.code == "X054").unwrap();
        assert_eq!(upload.name, "field-file-upload-to");
        assert_eq!(upload.groups, vec!["models"]);
        assert_eq!(upload.level, "WARNING");

        let extra_kwargs = rows.iter().find(|r| r.code == "X301").unwrap();
        assert_eq!(extra_kwargs.level, "ERROR");

        assert!(rows.iter().find(|r| r.code == "X056").unwrap().deprecated);
        assert_eq!(rows.iter().find(|r| r.code == "X010").unwrap().options, vec!["attrs"]);
    }
}
