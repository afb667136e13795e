//! Diagnostic data contract shared by checks, drivers and front ends.

use miette::{LabeledSpan, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::check_id::CheckId;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Debug output.
    Debug,
    /// Informational message.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
    /// Critical problem, e.g. a broken configuration.
    Critical,
}

impl Level {
    /// Configuration spellings, lowest first.
    pub const NAMES: &'static [&'static str] = &["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

    /// Configuration spelling of this level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Parses a level name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARNING" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown level: {s}"))
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            length: 0,
        }
    }

    /// Sets the span length in bytes.
    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }
}

/// An automatic code replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// Where the replaced span starts; `location.length` bytes are replaced.
    pub location: Location,
    /// New text to insert.
    pub new_text: String,
}

impl Replacement {
    /// Creates a pure insertion at `location`.
    #[must_use]
    pub fn insert(location: Location, new_text: impl Into<String>) -> Self {
        Self {
            location: location.with_length(0),
            new_text: new_text.into(),
        }
    }
}

/// Calculates the byte offset of a 1-indexed line and column.
///
/// Positions past the end clamp to the content length.
#[must_use]
pub fn offset_for(content: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }

    let mut offset = 0;
    for (i, line_content) in content.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            return (offset + column.saturating_sub(1)).min(content.len());
        }
        offset += line_content.len();
    }

    content.len()
}

/// Applies replacements to `content`, last position first so earlier
/// offsets stay valid. Replacements that do not land on a character
/// boundary are skipped.
#[must_use]
pub fn apply_replacements<'a, I>(content: &str, replacements: I) -> String
where
    I: IntoIterator<Item = &'a Replacement>,
{
    let mut edits: Vec<(usize, usize, &str)> = replacements
        .into_iter()
        .map(|r| {
            let start = offset_for(content, r.location.line, r.location.column);
            let end = (start + r.location.length).min(content.len());
            (start, end, r.new_text.as_str())
        })
        .collect();
    edits.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

    let mut out = content.to_owned();
    for (start, end, text) in edits {
        if out.is_char_boundary(start) && out.is_char_boundary(end) {
            out.replace_range(start..end, text);
        }
    }
    out
}

/// The object a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ObjectRef {
    /// A model class, by `app_label.ModelName`.
    Model {
        /// Model label.
        label: String,
    },
    /// A model field.
    Field {
        /// Owning model label.
        model: String,
        /// Field name.
        name: String,
    },
    /// A serializer class, by dotted path.
    Serializer {
        /// Dotted class path.
        path: String,
    },
}

impl ObjectRef {
    /// Short name: model name, field name or serializer class name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Model { label } => label.rsplit('.').next().unwrap_or(label),
            Self::Field { name, .. } => name,
            Self::Serializer { path } => path.rsplit('.').next().unwrap_or(path),
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model { label } => write!(f, "{label}"),
            Self::Field { model, name } => write!(f, "{model}.{name}"),
            Self::Serializer { path } => write!(f, "{path}"),
        }
    }
}

/// A single finding emitted by a check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Emitting check; serialized as its short code.
    pub id: CheckId,
    /// Severity of this diagnostic.
    pub level: Level,
    /// Message, always ending with `[check-name]`.
    pub message: String,
    /// Optional hint on how to fix it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Object the diagnostic is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectRef>,
    /// Source position of the relevant declaration, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Automatic fix, when the check can produce one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Replacement>,
}

impl Diagnostic {
    /// Creates a new diagnostic. The message is used verbatim.
    #[must_use]
    pub fn new(id: CheckId, level: Level, message: impl Into<String>) -> Self {
        Self {
            id,
            level,
            message: message.into(),
            hint: None,
            object: None,
            location: None,
            fix: None,
        }
    }

    /// Adds a hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Sets the object this diagnostic is about.
    #[must_use]
    pub fn with_object(mut self, object: ObjectRef) -> Self {
        self.object = Some(object);
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attaches an automatic fix.
    #[must_use]
    pub fn with_fix(mut self, fix: Replacement) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Short code of the emitting check, e.g. `X050`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.id.code()
    }

    /// File the fix applies to, if any.
    #[must_use]
    pub fn fix_file(&self) -> Option<&Path> {
        self.fix.as_ref().map(|f| f.location.file.as_path())
    }

    /// Formats the diagnostic for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = String::new();
        let _ = write!(output, "{}", self.code());
        if let Some(object) = &self.object {
            let _ = write!(output, " {object}");
        }
        if let Some(loc) = &self.location {
            let _ = write!(output, " at {}:{}:{}", loc.file.display(), loc.line, loc.column);
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "  {}: {}", self.level, self.message);
        if let Some(hint) = &self.hint {
            for (i, line) in hint.lines().enumerate() {
                let prefix = if i == 0 { "  = hint: " } else { "          " };
                let _ = writeln!(output, "{prefix}{line}");
            }
        }
        if self.fix.is_some() {
            let _ = writeln!(output, "  = fix available (--fix)");
        }
        output
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{}:{}:{}: ", loc.file.display(), loc.line, loc.column)?;
        }
        if let Some(object) = &self.object {
            write!(f, "{object}: ")?;
        }
        write!(f, "({}) {}: {}", self.code(), self.level, self.message)
    }
}

/// Converts a [`Diagnostic`] to a miette diagnostic for rich display.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DiagnosticReport {
    message: String,
    code: String,
    level: Level,
    help: Option<String>,
    source_code: Option<NamedSource<String>>,
    span: Option<SourceSpan>,
    label: String,
}

impl DiagnosticReport {
    /// Attaches the file content so the report can point at the declaration.
    #[must_use]
    pub fn with_source(mut self, name: &str, content: String, location: &Location) -> Self {
        let offset = offset_for(&content, location.line, location.column);
        let length = content[offset..]
            .find('\n')
            .unwrap_or(content.len() - offset);
        self.span = Some(SourceSpan::from((offset, length)));
        self.source_code = Some(NamedSource::new(name, content));
        self
    }
}

impl From<&Diagnostic> for DiagnosticReport {
    fn from(d: &Diagnostic) -> Self {
        Self {
            message: d.message.clone(),
            code: d.code().to_owned(),
            level: d.level,
            help: d.hint.clone(),
            source_code: None,
            span: None,
            label: d
                .object
                .as_ref()
                .map_or_else(|| d.id.name().to_owned(), ToString::to_string),
        }
    }
}

impl miette::Diagnostic for DiagnosticReport {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(&self.code))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.level {
            Level::Debug | Level::Info => miette::Severity::Advice,
            Level::Warning => miette::Severity::Warning,
            Level::Error | Level::Critical => miette::Severity::Error,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_code
            .as_ref()
            .map(|s| s as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.label.clone()),
            span,
        ))))
    }
}

/// Outcome of a full bind+run pass.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    /// All surviving diagnostics, in emission order.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether configuration resolution succeeded.
    pub healthy: bool,
}

impl Report {
    /// Creates an empty, healthy report.
    #[must_use]
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            healthy: true,
        }
    }

    /// Returns true if any diagnostic is at or above `level`.
    #[must_use]
    pub fn has_at_least(&self, level: Level) -> bool {
        self.diagnostics.iter().any(|d| d.level >= level)
    }

    /// Counts diagnostics per level.
    #[must_use]
    pub fn count_by_level(&self) -> BTreeMap<Level, usize> {
        let mut counts = BTreeMap::new();
        for d in &self.diagnostics {
            *counts.entry(d.level).or_insert(0) += 1;
        }
        counts
    }

    /// Groups available fixes by the file they apply to.
    #[must_use]
    pub fn fixes_by_file(&self) -> BTreeMap<&Path, Vec<&Replacement>> {
        let mut files: BTreeMap<&Path, Vec<&Replacement>> = BTreeMap::new();
        for fix in self.diagnostics.iter().filter_map(|d| d.fix.as_ref()) {
            files.entry(fix.location.file.as_path()).or_default().push(fix);
        }
        files
    }

    /// One-line summary, e.g. `2 error(s), 1 warning(s)`.
    #[must_use]
    pub fn summary(&self) -> String {
        let counts = self.count_by_level();
        let get = |l: Level| counts.get(&l).copied().unwrap_or(0);
        format!(
            "{} critical, {} error(s), {} warning(s), {} info(s), {} debug",
            get(Level::Critical),
            get(Level::Error),
            get(Level::Warning),
            get(Level::Info),
            get(Level::Debug),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering_and_parsing() {
        assert!(Level::Critical > Level::Error);
        assert!(Level::Debug < Level::Info);
        assert_eq!(Level::parse("warning"), Some(Level::Warning));
        assert_eq!(Level::parse("FAKE"), None);
        assert_eq!(Level::Error.as_str(), "ERROR");
    }

    #[test]
    fn offset_calculation() {
        let content = "line1\nline2\nline3";
        assert_eq!(offset_for(content, 1, 1), 0);
        assert_eq!(offset_for(content, 2, 1), 6);
        assert_eq!(offset_for(content, 2, 3), 8);
        assert_eq!(offset_for(content, 9, 1), content.len());
    }

    #[test]
    fn replacements_apply_bottom_up() {
        let content = "a\nb\nc\n";
        let edits = vec![
            Replacement::insert(Location::new("f.py", 2, 1), "x\n"),
            Replacement::insert(Location::new("f.py", 3, 1), "y\n"),
        ];
        assert_eq!(apply_replacements(content, &edits), "a\nx\nb\ny\nc\n");
    }

    #[test]
    fn replacement_with_length_replaces_span() {
        let content = "value = old\n";
        let edit = Replacement {
            location: Location::new("f.py", 1, 9).with_length(3),
            new_text: "new".into(),
        };
        assert_eq!(apply_replacements(content, [&edit]), "value = new\n");
    }

    #[test]
    fn object_ref_names() {
        let field = ObjectRef::Field {
            model: "example.Article".into(),
            name: "title".into(),
        };
        assert_eq!(field.name(), "title");
        assert_eq!(field.to_string(), "example.Article.title");
        let model = ObjectRef::Model {
            label: "example.Article".into(),
        };
        assert_eq!(model.name(), "Article");
    }

    #[test]
    fn report_counts_and_threshold() {
        let mut report = Report::new();
        report
            .diagnostics
            .push(Diagnostic::new(CheckId::X050, Level::Warning, "w"));
        report
            .diagnostics
            .push(Diagnostic::new(CheckId::X301, Level::Error, "e"));
        assert!(report.has_at_least(Level::Error));
        assert!(!report.has_at_least(Level::Critical));
        assert_eq!(report.count_by_level().get(&Level::Warning), Some(&1));
    }
}
