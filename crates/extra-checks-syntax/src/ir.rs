//! Owned intermediate representation of a Python module.
//!
//! The IR keeps only the declaration shapes the checks look at: class
//! bodies, simple assignments, call expressions with their keyword
//! arguments, imports and module-level calls. Everything else collapses
//! into [`Stmt::Other`] / [`Expr::Other`].

/// A 1-indexed line with a 0-indexed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column (0-indexed byte offset within line).
    pub column: usize,
}

/// A source range, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// First character.
    pub start: Position,
    /// Just past the last character.
    pub end: Position,
}

/// A parsed Python module.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Classes declared at module level (including inside `if`/`try`/`with`).
    pub classes: Vec<ClassDef>,
    /// Module-level assignments.
    pub assignments: Vec<Assign>,
    /// Module-level expression-statement calls, e.g. `admin.site.register(M)`.
    pub calls: Vec<Call>,
    /// Import bindings introduced at module level.
    pub imports: Vec<Import>,
    /// Whether tree-sitter reported syntax errors.
    pub has_errors: bool,
}

impl Module {
    /// Finds a module-level class by name. The last definition wins.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().rev().find(|c| c.name == name)
    }

    /// Finds the last module-level assignment to `name`.
    #[must_use]
    pub fn assignment(&self, name: &str) -> Option<&Assign> {
        self.assignments
            .iter()
            .rev()
            .find(|a| a.targets.iter().any(|t| t == name))
    }
}

/// One name bound by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Local name the import binds.
    pub local: String,
    /// Dotted target, relative to the package when `level > 0`.
    pub target: String,
    /// Number of leading dots of a relative import.
    pub level: usize,
}

/// A class definition.
#[derive(Debug, Clone)]
pub struct ClassDef {
    /// Class name.
    pub name: String,
    /// Positional base expressions.
    pub bases: Vec<Expr>,
    /// Keyword arguments of the class statement (`metaclass=...`).
    pub keywords: Vec<Keyword>,
    /// Decorator expressions, outermost first.
    pub decorators: Vec<Expr>,
    /// First line of the definition, decorators included.
    pub line: usize,
    /// Line of the `class` keyword.
    pub class_line: usize,
    /// Last line of the class body.
    pub end_line: usize,
    /// Column of the `class` keyword (or first decorator).
    pub column: usize,
    /// Column of the first body statement.
    pub body_column: usize,
    /// Body statements in source order.
    pub body: Vec<Stmt>,
}

impl ClassDef {
    /// Iterates over body assignments.
    pub fn assignments(&self) -> impl Iterator<Item = &Assign> {
        self.body.iter().filter_map(|s| match s {
            Stmt::Assign(a) => Some(a),
            _ => None,
        })
    }

    /// Iterates over nested classes.
    pub fn nested_classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.body.iter().filter_map(|s| match s {
            Stmt::Class(c) => Some(c),
            _ => None,
        })
    }

    /// Returns the nested class `name`, the last one if redefined.
    #[must_use]
    pub fn nested_class(&self, name: &str) -> Option<&ClassDef> {
        self.nested_classes().filter(|c| c.name == name).last()
    }

    /// Returns the last assignment to `name` in the body.
    #[must_use]
    pub fn assignment(&self, name: &str) -> Option<&Assign> {
        self.assignments()
            .filter(|a| a.targets.iter().any(|t| t == name))
            .last()
    }

    /// Names bound in the body: assignment targets, methods and nested classes.
    pub fn bound_names(&self) -> impl Iterator<Item = &str> {
        self.body.iter().flat_map(|s| -> Box<dyn Iterator<Item = &str> + '_> {
            match s {
                Stmt::Assign(a) => Box::new(a.targets.iter().map(String::as_str)),
                Stmt::Class(c) => Box::new(std::iter::once(c.name.as_str())),
                Stmt::Function { name, .. } => Box::new(std::iter::once(name.as_str())),
                Stmt::Other { .. } => Box::new(std::iter::empty()),
            }
        })
    }

    /// Line of the last body statement's end.
    #[must_use]
    pub fn last_body_line(&self) -> usize {
        self.body.iter().map(Stmt::end_line).max().unwrap_or(self.class_line)
    }
}

/// A statement in a class body.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `a = b = value` or `a: T = value`.
    Assign(Assign),
    /// Nested class.
    Class(ClassDef),
    /// `def name(...)`.
    Function {
        /// Function name.
        name: String,
        /// First line.
        line: usize,
        /// Last line.
        end_line: usize,
    },
    /// Anything else.
    Other {
        /// First line.
        line: usize,
        /// Last line.
        end_line: usize,
    },
}

impl Stmt {
    /// First line of the statement.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Assign(a) => a.line,
            Self::Class(c) => c.line,
            Self::Function { line, .. } | Self::Other { line, .. } => *line,
        }
    }

    /// Last line of the statement.
    #[must_use]
    pub fn end_line(&self) -> usize {
        match self {
            Self::Assign(a) => a.end_line,
            Self::Class(c) => c.end_line,
            Self::Function { end_line, .. } | Self::Other { end_line, .. } => *end_line,
        }
    }
}

/// An assignment statement with simple-name targets.
#[derive(Debug, Clone)]
pub struct Assign {
    /// Target names (`a = b = 1` yields both).
    pub targets: Vec<String>,
    /// Right-hand side. `None` for a bare annotation.
    pub value: Option<Expr>,
    /// First line.
    pub line: usize,
    /// Last line.
    pub end_line: usize,
    /// Start of the right-hand side expression.
    pub value_start: Position,
    /// Spans of the elements when the value is a list or tuple literal.
    pub element_spans: Vec<Span>,
}

/// A call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// The callee.
    pub func: Box<Expr>,
    /// Positional arguments.
    pub args: Vec<Expr>,
    /// Keyword arguments in source order.
    pub keywords: Vec<Keyword>,
}

impl Call {
    /// Returns the value of keyword argument `name`.
    #[must_use]
    pub fn keyword(&self, name: &str) -> Option<&Expr> {
        self.keywords
            .iter()
            .find(|k| k.name == name)
            .map(|k| &k.value)
    }

    /// Dotted name of the callee, if it is a name or attribute chain.
    #[must_use]
    pub fn func_name(&self) -> Option<&str> {
        self.func.dotted()
    }
}

/// `name=value` inside a call.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    /// Argument name.
    pub name: String,
    /// Argument value.
    pub value: Expr,
}

/// A Python expression, reduced to the shapes the checks inspect.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `foo`
    Name(String),
    /// `foo.bar.baz` (dotted text).
    Attribute(String),
    /// `f(...)`
    Call(Call),
    /// String literal, prefixes and quotes removed.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Float literal, kept as written.
    Float(String),
    /// `True` / `False`
    Bool(bool),
    /// `None`
    None,
    /// `[...]`
    List(Vec<Expr>),
    /// `(...)` with at least one comma.
    Tuple(Vec<Expr>),
    /// `{k: v}`
    Dict(Vec<(Expr, Expr)>),
    /// Any other expression, as source text.
    Other(String),
}

impl Expr {
    /// Dotted name of a `Name` or `Attribute`.
    #[must_use]
    pub fn dotted(&self) -> Option<&str> {
        match self {
            Self::Name(n) | Self::Attribute(n) => Some(n),
            _ => None,
        }
    }

    /// Value of a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Value of a boolean literal.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The call, if this is one.
    #[must_use]
    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Self::Call(c) => Some(c),
            _ => None,
        }
    }

    /// Elements of a list or tuple literal.
    #[must_use]
    pub fn elements(&self) -> Option<&[Expr]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is the `None` literal.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Python truthiness for literals; `None` when it cannot be decided statically.
    #[must_use]
    pub fn truthy(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::None => Some(false),
            Self::Str(s) => Some(!s.is_empty()),
            Self::Int(i) => Some(*i != 0),
            Self::List(v) | Self::Tuple(v) => Some(!v.is_empty()),
            Self::Dict(v) => Some(!v.is_empty()),
            _ => None,
        }
    }

    /// Last segment of a dotted name (`models.CharField` gives `CharField`).
    #[must_use]
    pub fn last_segment(&self) -> Option<&str> {
        self.dotted().and_then(|d| d.rsplit('.').next())
    }
}

/// Removes the common leading whitespace of all non-blank lines.
///
/// Returns the dedented text and the number of columns removed.
#[must_use]
pub fn dedent(text: &str) -> (String, usize) {
    let width = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    if width == 0 {
        return (text.to_owned(), 0);
    }
    let out = text
        .lines()
        .map(|l| if l.len() >= width { &l[width..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n");
    (out, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedent_removes_common_indent() {
        let (text, width) = dedent("    class A:\n        x = 1\n\n    # c\n");
        assert_eq!(width, 4);
        assert_eq!(text, "class A:\n    x = 1\n\n# c");
    }

    #[test]
    fn dedent_keeps_flush_text() {
        let (text, width) = dedent("class A:\n    pass");
        assert_eq!(width, 0);
        assert_eq!(text, "class A:\n    pass");
    }

    #[test]
    fn truthiness_of_literals() {
        assert_eq!(Expr::Str(String::new()).truthy(), Some(false));
        assert_eq!(Expr::Str("x".into()).truthy(), Some(true));
        assert_eq!(Expr::None.truthy(), Some(false));
        assert_eq!(Expr::Name("x".into()).truthy(), None);
    }

    #[test]
    fn last_segment_of_attribute() {
        let e = Expr::Attribute("models.CharField".into());
        assert_eq!(e.last_segment(), Some("CharField"));
    }
}
