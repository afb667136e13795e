//! # extra-checks-syntax
//!
//! Tree-sitter based Python front end for extra-checks.
//!
//! The crate turns Python source into a small owned IR ([`Module`],
//! [`ClassDef`], [`Assign`], [`Expr`]) that the check engine can index
//! without holding on to tree-sitter trees:
//!
//! - [`PythonParser`] parses a file or a class snippet
//! - [`dedent`] normalises class snippets cut out of nested blocks

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ir;
pub mod python;

pub use ir::{dedent, Assign, Call, ClassDef, Expr, Import, Keyword, Module, Position, Span, Stmt};
pub use python::{PythonParser, SyntaxError};

/// Parses Python source with a fresh [`PythonParser`].
///
/// # Errors
///
/// Returns an error if the grammar cannot be loaded.
pub fn parse(source: &str) -> Result<Module, SyntaxError> {
    PythonParser::new().parse(source)
}
