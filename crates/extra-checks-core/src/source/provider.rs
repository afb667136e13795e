//! Source text retrieval.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use extra_checks_syntax::dedent;

/// Reads source files on behalf of class views.
pub trait SourceProvider {
    /// Returns the content of `path`, or `None` when it cannot be read.
    fn read(&self, path: &Path) -> Option<String>;
}

/// Reads from the file system. Files are closed right after reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceProvider;

impl SourceProvider for FsSourceProvider {
    fn read(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Source not readable");
                None
            }
        }
    }
}

/// Serves sources from memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceProvider {
    files: HashMap<PathBuf, String>,
}

impl MemorySourceProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Paths of every stored file.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }
}

impl<P: Into<PathBuf>, C: Into<String>> FromIterator<(P, C)> for MemorySourceProvider {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut provider = Self::new();
        for (path, content) in iter {
            provider.insert(path, content);
        }
        provider
    }
}

impl SourceProvider for MemorySourceProvider {
    fn read(&self, path: &Path) -> Option<String> {
        self.files.get(path).cloned()
    }
}

/// Where a class is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLocation {
    /// Declaring file.
    pub path: PathBuf,
    /// First line of the declaration, decorators included (1-indexed).
    pub line: usize,
    /// Last line of the class body.
    pub end_line: usize,
}

/// The source text of one class, cut out of its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSource {
    /// Declaring file.
    pub path: PathBuf,
    /// Dedented class text; line 1 is the first declaration line.
    pub text: String,
    /// File line of snippet line 1.
    pub first_line: usize,
    /// Columns removed by dedenting.
    pub indent: usize,
    /// Contiguous comment lines directly above the class, nearest first.
    pub leading_comments: Vec<String>,
}

impl ClassSource {
    /// Cuts the class at `location` out of `file_text`.
    ///
    /// Returns `None` when the location lies outside the text.
    #[must_use]
    pub fn extract(file_text: &str, location: &ClassLocation) -> Option<Self> {
        let lines: Vec<&str> = file_text.lines().collect();
        if location.line == 0 || location.line > lines.len() {
            return None;
        }
        let end = location.end_line.clamp(location.line, lines.len());
        let (text, indent) = dedent(&lines[location.line - 1..end].join("\n"));

        let leading_comments = lines[..location.line - 1]
            .iter()
            .rev()
            .map(|l| l.trim())
            .take_while(|l| l.starts_with('#'))
            .map(String::from)
            .collect();

        Some(Self {
            path: location.path.clone(),
            text,
            first_line: location.line,
            indent,
            leading_comments,
        })
    }

    /// Snippet line `line` (1-indexed).
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1).and_then(|i| self.text.lines().nth(i))
    }

    /// File line of snippet line `line`.
    #[must_use]
    pub fn file_line(&self, line: usize) -> usize {
        self.first_line + line.saturating_sub(1)
    }
}
