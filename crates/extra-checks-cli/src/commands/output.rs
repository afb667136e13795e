//! Shared output formatting for check results.

use anyhow::Result;
use extra_checks::{Diagnostic, DiagnosticReport, Level, Project, Report};
use miette::GraphicalReportHandler;

use crate::OutputFormat;

/// Print a report in the specified format.
pub fn print(report: &Report, format: OutputFormat, project: &Project) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report, project),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Compact => print_compact(report),
    }
    Ok(())
}

fn print_text(report: &Report, project: &Project) {
    let handler = GraphicalReportHandler::new();
    for diagnostic in &report.diagnostics {
        let mut rendered = String::new();
        match graphical(diagnostic, project) {
            Some(pretty) if handler.render_report(&mut rendered, &pretty).is_ok() => {
                println!("{rendered}");
            }
            _ => println!("{}", diagnostic.format()),
        }
    }

    let counts = report.count_by_level();
    let at_least = |level: Level| counts.range(level..).map(|(_, n)| n).sum::<usize>();
    let summary_color = if at_least(Level::Error) > 0 {
        "\x1b[31m"
    } else if at_least(Level::Warning) > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}System check identified {} issue(s): {} in {} file(s)\x1b[0m",
        summary_color,
        report.diagnostics.len(),
        report.summary(),
        project.file_count()
    );
}

/// A source-annotated report, when the declaration can be read.
fn graphical(diagnostic: &Diagnostic, project: &Project) -> Option<DiagnosticReport> {
    let location = diagnostic.location.as_ref()?;
    let content = project.provider().read(&location.file)?;
    let name = location.file.display().to_string();
    Some(DiagnosticReport::from(diagnostic).with_source(&name, content, location))
}

fn print_json(report: &Report) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

fn print_compact(report: &Report) {
    for diagnostic in &report.diagnostics {
        println!("{}", compact_line(diagnostic));
    }
}

fn compact_line(diagnostic: &Diagnostic) -> String {
    let place = match (&diagnostic.location, &diagnostic.object) {
        (Some(loc), _) => format!("{}:{}:{}", loc.file.display(), loc.line, loc.column),
        (None, Some(object)) => object.to_string(),
        (None, None) => "?".to_owned(),
    };
    format!(
        "{place}: {} [{}] {}",
        diagnostic.level,
        diagnostic.code(),
        diagnostic.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use extra_checks::{CheckId, Location};

    #[test]
    fn compact_prefers_location() {
        let diagnostic = Diagnostic::new(CheckId::X054, Level::Warning, "Field must have upload_to.")
            .with_location(Location::new("shop/models.py", 7, 5));
        assert_eq!(
            compact_line(&diagnostic),
            "shop/models.py:7:5: warning [X054] Field must have upload_to."
        );
    }

    #[test]
    fn compact_without_location() {
        let diagnostic = Diagnostic::new(CheckId::X001, Level::Critical, "Invalid EXTRA_CHECKS config.");
        assert_eq!(compact_line(&diagnostic), "?: critical [X001] Invalid EXTRA_CHECKS config.");
    }
}
