//! # extra-checks-core
//!
//! Core of the extra-checks lint engine for Django models and Django REST
//! framework serializers.
//!
//! This crate provides:
//!
//! - [`CheckId`] and [`Tag`], the closed catalogue of identities and groups
//! - the check trait family ([`ModelCheck`], [`FieldCheck`],
//!   [`SerializerCheck`], [`ConfigCheck`]) and the bound [`CheckUnit`]
//! - configuration resolution with a structured [`ErrorTree`]
//! - [`ClassView`], a lazily parsed per-class source view with
//!   disable-comment support
//! - [`Registry`] and [`Controller`], the bind phase and the group drivers
//! - [`Project`], a static index of a Django project
//!
//! ## Example
//!
//! ```ignore
//! use extra_checks_core::{IgnoreRegistry, Project, ProjectConfig, Settings, Tag};
//!
//! let project = Project::load(&ProjectConfig::with_root("."))?;
//! let controller = registry.bind(&Settings::new(document), project.ignore_registry());
//! for diagnostic in controller.run(Tag::Models, &project, None) {
//!     println!("{diagnostic}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod check;
mod check_id;
pub mod config;
mod drivers;
mod ignore;
pub mod project;
mod registry;
pub mod source;
mod types;

pub use check::{
    Check, CheckBase, CheckKind, CheckUnit, ConfigCheck, FieldCheck, ModelCheck, SerializerCheck,
    SerializerScope, Target,
};
pub use check_id::{CheckId, Tag};
pub use config::{
    CheckSettings, ChecksConfig, ConfigError, ConfigFile, ErrorTree, FieldKind, ProjectConfig, Schema,
    Settings, SkipIf,
};
pub use ignore::{IgnoreRegistration, IgnoreRegistry};
pub use project::{Project, ProjectError};
pub use registry::{CatalogueEntry, Controller, Driver, Registry};
pub use source::{ArgView, ClassView, FieldSource, SourceUnavailable};
pub use types::{
    apply_replacements, offset_for, Diagnostic, DiagnosticReport, Level, Location, ObjectRef, Replacement,
    Report,
};

/// The Python syntax front end.
pub use extra_checks_syntax as syntax;
