//! Lazy per-class source view.

use std::cell::{OnceCell, RefCell};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use extra_checks_syntax::{Assign, Call, ClassDef, Expr, PythonParser, Span};

use super::comments::{disabled_checks, DisabledChecks};
use super::provider::{ClassLocation, ClassSource, SourceProvider};
use crate::check_id::CheckId;
use crate::types::{offset_for, Location};

/// Raised by a field check that needs source and has none.
///
/// Drivers recover from it per field; it never becomes a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no source available for {object}")]
pub struct SourceUnavailable {
    /// The object whose source is missing.
    pub object: String,
}

struct ParsedClass {
    source: ClassSource,
    class: Option<ClassDef>,
}

/// Source view of one declaring class.
///
/// Nothing is read or parsed until the first query. A class without
/// retrievable source answers every query with "no information".
pub struct ClassView<'p> {
    provider: &'p dyn SourceProvider,
    location: Option<ClassLocation>,
    parsed: OnceCell<Option<ParsedClass>>,
    disabled: RefCell<HashMap<usize, DisabledChecks>>,
}

impl std::fmt::Debug for ClassView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassView")
            .field("location", &self.location)
            .field("parsed", &self.parsed.get().map(Option::is_some))
            .finish_non_exhaustive()
    }
}

impl<'p> ClassView<'p> {
    /// Creates a view; `location` is `None` for dynamically built classes.
    #[must_use]
    pub fn new(provider: &'p dyn SourceProvider, location: Option<ClassLocation>) -> Self {
        Self {
            provider,
            location,
            parsed: OnceCell::new(),
            disabled: RefCell::new(HashMap::new()),
        }
    }

    fn parsed(&self) -> Option<&ParsedClass> {
        self.parsed
            .get_or_init(|| {
                let location = self.location.as_ref()?;
                let text = self.provider.read(&location.path)?;
                let source = ClassSource::extract(&text, location)?;
                let class = match PythonParser::new().parse(&source.text) {
                    Ok(module) => module.classes.into_iter().next(),
                    Err(e) => {
                        debug!(path = %location.path.display(), error = %e, "Class source not parsed");
                        None
                    }
                };
                Some(ParsedClass { source, class })
            })
            .as_ref()
    }

    /// Whether source text could be retrieved.
    #[must_use]
    pub fn has_source(&self) -> bool {
        self.parsed().is_some()
    }

    /// The extracted class text.
    #[must_use]
    pub fn source(&self) -> Option<&ClassSource> {
        self.parsed().map(|p| &p.source)
    }

    /// The parsed class, line numbers relative to the snippet.
    #[must_use]
    pub fn class_def(&self) -> Option<&ClassDef> {
        self.parsed().and_then(|p| p.class.as_ref())
    }

    /// Top-level assignment to `name` in the class body.
    #[must_use]
    pub fn get_assignment(&self, name: &str) -> Option<&Assign> {
        self.class_def()?.assignment(name)
    }

    /// The nested `Meta` class.
    #[must_use]
    pub fn meta(&self) -> Option<&ClassDef> {
        self.class_def()?.nested_class("Meta")
    }

    /// Names assigned inside the nested `Meta` class.
    #[must_use]
    pub fn meta_names(&self) -> BTreeSet<&str> {
        self.meta()
            .map(|meta| {
                meta.assignments()
                    .flat_map(|a| a.targets.iter().map(String::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snippet line of `class Meta`. With several candidates (nested
    /// definitions) the least indented one wins.
    #[must_use]
    pub fn meta_line(&self) -> Option<usize> {
        let source = self.source()?;
        source
            .text
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let stripped = line.trim_start();
                let rest = stripped.strip_prefix("class Meta")?;
                rest.starts_with([':', '(', ' '])
                    .then_some((line.len() - stripped.len(), i + 1))
            })
            .min_by_key(|(indent, line)| (*indent, *line))
            .map(|(_, line)| line)
    }

    /// Checks disabled by comments directly above snippet line `line`.
    ///
    /// Line 1 looks at the comments above the class declaration.
    #[must_use]
    pub fn disabled_checks_for_line(&self, line: usize) -> DisabledChecks {
        if let Some(cached) = self.disabled.borrow().get(&line) {
            return cached.clone();
        }
        let found = self.collect_disabled(line);
        self.disabled.borrow_mut().insert(line, found.clone());
        found
    }

    fn collect_disabled(&self, line: usize) -> DisabledChecks {
        let Some(source) = self.source() else {
            return DisabledChecks::none();
        };
        if line <= 1 {
            return disabled_checks(source.leading_comments.iter().map(String::as_str));
        }
        let lines: Vec<&str> = source.text.lines().collect();
        let above = lines[..(line - 1).min(lines.len())]
            .iter()
            .rev()
            .map(|l| l.trim())
            .take_while(|l| l.starts_with('#'));
        disabled_checks(above)
    }

    /// Whether `id` is disabled by a comment above snippet line `line`.
    #[must_use]
    pub fn is_disabled_by_comment(&self, id: CheckId, line: usize) -> bool {
        self.disabled_checks_for_line(line).contains(id)
    }

    /// Whether a class-level diagnostic of `id` is disabled.
    ///
    /// Meta-scoped checks look above `class Meta` (nothing is disabled
    /// when the class has none); all others look above the class.
    #[must_use]
    pub fn is_disabled_for_class(&self, id: CheckId, meta_scoped: bool) -> bool {
        if meta_scoped {
            return self
                .meta_line()
                .is_some_and(|line| self.is_disabled_by_comment(id, line));
        }
        self.is_disabled_by_comment(id, 1)
    }

    /// File location of snippet line `line` at snippet column `column` (0-indexed).
    #[must_use]
    pub fn file_position(&self, line: usize, column: usize) -> Option<Location> {
        let source = self.source()?;
        Some(Location::new(
            source.path.clone(),
            source.file_line(line),
            source.indent + column + 1,
        ))
    }

    /// File location covering snippet span `span`, with its byte length.
    #[must_use]
    pub fn span_location(&self, span: Span) -> Option<Location> {
        let source = self.source()?;
        let start = offset_for(&source.text, span.start.line, span.start.column + 1);
        let end = offset_for(&source.text, span.end.line, span.end.column + 1);
        // Every line after the first lost `indent` bytes to dedenting.
        let length = end.checked_sub(start)? + source.indent * (span.end.line - span.start.line);
        Some(self.file_position(span.start.line, span.start.column)?.with_length(length))
    }

    /// Location of the class declaration itself.
    #[must_use]
    pub fn class_location(&self) -> Option<Location> {
        let line = self.class_def().map_or(1, |c| c.class_line);
        self.file_position(line, 0)
    }

    /// Source access for field `name`.
    ///
    /// `related` fields never take their verbose name positionally.
    #[must_use]
    pub fn field<'v>(&'v self, name: &'v str, related: bool) -> FieldSource<'v> {
        FieldSource {
            view: self,
            name,
            related,
        }
    }
}

/// Source of one field assignment inside a [`ClassView`].
#[derive(Debug, Clone, Copy)]
pub struct FieldSource<'v> {
    view: &'v ClassView<'v>,
    name: &'v str,
    related: bool,
}

impl<'v> FieldSource<'v> {
    /// The field name.
    #[must_use]
    pub fn name(&self) -> &'v str {
        self.name
    }

    /// The view of the declaring class.
    #[must_use]
    pub fn view(&self) -> &'v ClassView<'v> {
        self.view
    }

    fn unavailable(&self) -> SourceUnavailable {
        SourceUnavailable {
            object: self.name.to_owned(),
        }
    }

    /// The assignment statement.
    ///
    /// # Errors
    ///
    /// Fails when the class has no source or does not assign the field.
    pub fn assignment(&self) -> Result<&'v Assign, SourceUnavailable> {
        self.view
            .get_assignment(self.name)
            .ok_or_else(|| self.unavailable())
    }

    /// The constructor call on the right-hand side.
    ///
    /// # Errors
    ///
    /// Fails when the field assignment is not available.
    pub fn call(&self) -> Result<Option<&'v Call>, SourceUnavailable> {
        Ok(self.assignment()?.value.as_ref().and_then(Expr::as_call))
    }

    /// Whether keyword argument `name` was passed.
    ///
    /// # Errors
    ///
    /// Fails when the field assignment is not available.
    pub fn has_kwarg(&self, name: &str) -> Result<bool, SourceUnavailable> {
        Ok(self.call()?.is_some_and(|c| c.keyword(name).is_some()))
    }

    /// The source expression of argument `name`.
    ///
    /// `verbose_name` is also found as the first positional argument of
    /// non-related fields when that is a string or a call to a bare name.
    ///
    /// # Errors
    ///
    /// Fails when the field assignment is not available.
    pub fn get_arg(&self, name: &str) -> Result<Option<ArgView<'v>>, SourceUnavailable> {
        let Some(call) = self.call()? else {
            return Ok(None);
        };
        if let Some(value) = call.keyword(name) {
            return Ok(Some(ArgView(value)));
        }
        if name != "verbose_name" || self.related {
            return Ok(None);
        }
        Ok(call
            .args
            .first()
            .filter(|arg| match arg {
                Expr::Str(_) => true,
                Expr::Call(c) => matches!(*c.func, Expr::Name(_)),
                _ => false,
            })
            .map(ArgView))
    }

    /// Snippet line of the assignment.
    ///
    /// # Errors
    ///
    /// Fails when the field assignment is not available.
    pub fn line(&self) -> Result<usize, SourceUnavailable> {
        Ok(self.assignment()?.line)
    }

    /// Whether `id` is disabled by a comment above the assignment.
    #[must_use]
    pub fn is_disabled_by_comment(&self, id: CheckId) -> bool {
        self.line()
            .is_ok_and(|line| self.view.is_disabled_by_comment(id, line))
    }

    /// File location of the assignment.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        let line = self.line().ok()?;
        let column = self
            .view
            .class_def()
            .map_or(0, |c| c.body_column);
        self.view.file_position(line, column)
    }
}

/// A source argument expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArgView<'v>(&'v Expr);

impl<'v> ArgView<'v> {
    /// The raw expression.
    #[must_use]
    pub fn expr(&self) -> &'v Expr {
        self.0
    }

    /// Whether the argument is a call.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self.0, Expr::Call(_))
    }

    /// Name of the called function when it is a bare name, e.g. `_`.
    #[must_use]
    pub fn callable_func_name(&self) -> Option<&'v str> {
        match self.0 {
            Expr::Call(call) => match call.func.as_ref() {
                Expr::Name(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// First positional argument of a call when it is a string literal.
    #[must_use]
    pub fn first_str_arg(&self) -> Option<&'v str> {
        self.0.as_call()?.args.first()?.as_str()
    }

    /// Value of a string literal argument.
    #[must_use]
    pub fn as_str(&self) -> Option<&'v str> {
        self.0.as_str()
    }
}
