//! # extra-checks
//!
//! Static checks for Django models and Django REST framework serializers.
//!
//! This is the facade crate: it re-exports the core engine and the built-in
//! checks, and provides [`Runner`], a full bind and run pass over a
//! project.
//!
//! ## Quick Start
//!
//! ```toml
//! # extra-checks.toml
//! level = "WARNING"
//! checks = [
//!     "field-file-upload-to",
//!     { id = "model-attribute", attrs = ["site"] },
//! ]
//! ```
//!
//! ```no_run
//! use extra_checks::{ConfigFile, Runner};
//!
//! let config = ConfigFile::from_file("extra-checks.toml".as_ref())?;
//! let (_project, report) = Runner::from_config(&config).check()?;
//! for diagnostic in &report.diagnostics {
//!     println!("{diagnostic}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Suppression
//!
//! A comment directly above a field, a `class Meta` or a class disables
//! checks for that declaration:
//!
//! ```python
//! # extra-checks-disable-next-line field-verbose-name, X055
//! title = models.CharField(null=True)
//! ```
//!
//! A class decorated with `@ignore_checks("X010")` is skipped entirely by
//! the named checks.

#![forbid(unsafe_code)]

// Re-export core types and traits
pub use extra_checks_core::*;

/// Built-in checks and presets.
pub mod rules {
    pub use extra_checks_rules::*;
}

mod runner;

pub use runner::Runner;
