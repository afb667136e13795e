//! Check traits and the bound check unit.
//!
//! A check implements one of [`ModelCheck`], [`FieldCheck`],
//! [`SerializerCheck`] or [`ConfigCheck`]. At bind time it is wrapped in a
//! [`CheckUnit`] together with its resolved severity, ignore sets and skip
//! predicate. Drivers only ever talk to units.
//!
//! # Example
//!
//! ```
//! use extra_checks_core::{Check, CheckBase, CheckId, ClassView, Diagnostic, ModelCheck};
//! use extra_checks_core::project::{ModelClass, Project};
//!
//! struct NeedsStr;
//!
//! impl Check for NeedsStr {
//!     fn id(&self) -> CheckId {
//!         CheckId::X010
//!     }
//! }
//!
//! impl ModelCheck for NeedsStr {
//!     fn apply(&self, base: &CheckBase, model: &ModelClass, _: &ClassView<'_>, _: &Project) -> Vec<Diagnostic> {
//!         if model.has_attr("__str__") {
//!             Vec::new()
//!         } else {
//!             vec![base.message("Model must define __str__.", "Add a __str__ method.")]
//!         }
//!     }
//! }
//! ```

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::check_id::CheckId;
use crate::config::{ChecksConfig, SkipIf};
use crate::project::{django, Field, ModelClass, Project, SerializerClass};
use crate::source::{ClassView, FieldSource, SourceUnavailable};
use crate::types::{Diagnostic, Level, Location, ObjectRef};

/// The object a check is evaluated against.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A model class.
    Model(&'a ModelClass),
    /// One field of a model.
    Field {
        /// The model being checked.
        model: &'a ModelClass,
        /// The field.
        field: &'a Field,
    },
    /// A serializer class.
    Serializer(&'a SerializerClass),
    /// The bound configuration (self-check only).
    Config(&'a ChecksConfig),
}

impl Target<'_> {
    /// Key used by ignore registrations: the class path of the model or
    /// serializer. Fields are keyed by their model.
    #[must_use]
    pub fn object_key(&self) -> Option<&str> {
        match self {
            Self::Model(model) | Self::Field { model, .. } => Some(&model.path),
            Self::Serializer(serializer) => Some(&serializer.path),
            Self::Config(_) => None,
        }
    }

    /// Path of the target's runtime type.
    #[must_use]
    pub fn type_path(&self) -> Option<&str> {
        match self {
            Self::Model(_) => Some(django::MODEL_BASE),
            Self::Field { field, .. } => Some(&field.class_path),
            Self::Serializer(_) => Some(django::SERIALIZER_METACLASS),
            Self::Config(_) => None,
        }
    }

    /// Reference attached to diagnostics.
    #[must_use]
    pub fn object_ref(&self) -> Option<ObjectRef> {
        match self {
            Self::Model(model) => Some(ObjectRef::Model { label: model.label() }),
            Self::Field { model, field } => Some(ObjectRef::Field {
                model: model.label(),
                name: field.name.clone(),
            }),
            Self::Serializer(serializer) => Some(ObjectRef::Serializer {
                path: serializer.path.clone(),
            }),
            Self::Config(_) => None,
        }
    }
}

/// Identity shared by every check kind.
pub trait Check: Send + Sync {
    /// The check identity.
    fn id(&self) -> CheckId;

    /// Severity used when the configuration sets none.
    fn default_level(&self) -> Level {
        Level::Warning
    }

    /// Warnings logged when the check is bound.
    fn deprecation(&self) -> Option<&'static str> {
        None
    }
}

/// A check evaluated once per model.
pub trait ModelCheck: Check {
    /// Evaluates `model`. `view` is the model's source view.
    fn apply(
        &self,
        base: &CheckBase,
        model: &ModelClass,
        view: &ClassView<'_>,
        project: &Project,
    ) -> Vec<Diagnostic>;
}

/// A check evaluated once per model field.
pub trait FieldCheck: Check {
    /// Evaluates `field` of `model`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceUnavailable`] when the check needs source that
    /// cannot be found. The driver skips the field for this check.
    fn apply(
        &self,
        base: &CheckBase,
        model: &ModelClass,
        field: &Field,
        source: &FieldSource<'_>,
    ) -> Result<Vec<Diagnostic>, SourceUnavailable>;
}

/// Which serializers a [`SerializerCheck`] runs on, and which source line
/// its disable-comments live above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializerScope {
    /// Plain serializers, comments above the class.
    Plain,
    /// Model serializers, comments above the class.
    Model,
    /// Model serializers, comments above `class Meta`.
    ModelMeta,
}

/// A check evaluated once per serializer class.
pub trait SerializerCheck: Check {
    /// Serializers this check applies to.
    fn scope(&self) -> SerializerScope;

    /// Evaluates `serializer`.
    fn apply(&self, base: &CheckBase, serializer: &SerializerClass) -> Vec<Diagnostic>;
}

/// A check evaluated against the bound configuration.
pub trait ConfigCheck: Check {
    /// Evaluates `config`.
    fn apply(&self, base: &CheckBase, config: &ChecksConfig) -> Vec<Diagnostic>;
}

/// Target granularity of a bound check.
pub enum CheckKind {
    /// Class-level model check.
    Model(Box<dyn ModelCheck>),
    /// Field-level model check.
    Field(Box<dyn FieldCheck>),
    /// Serializer check.
    Serializer(Box<dyn SerializerCheck>),
    /// Self-check.
    Config(Box<dyn ConfigCheck>),
}

impl CheckKind {
    /// The wrapped check.
    #[must_use]
    pub fn check(&self) -> &dyn Check {
        match self {
            Self::Model(c) => c.as_ref(),
            Self::Field(c) => c.as_ref(),
            Self::Serializer(c) => c.as_ref(),
            Self::Config(c) => c.as_ref(),
        }
    }
}

impl fmt::Debug for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Model(_) => "Model",
            Self::Field(_) => "Field",
            Self::Serializer(_) => "Serializer",
            Self::Config(_) => "Config",
        };
        write!(f, "{kind}({})", self.check().id().code())
    }
}

/// Resolved settings every check carries.
#[derive(Debug, Clone)]
pub struct CheckBase {
    /// The check identity.
    pub id: CheckId,
    /// Severity of emitted diagnostics.
    pub level: Level,
    /// Class paths never evaluated.
    pub ignore_objects: BTreeSet<String>,
    /// Type paths never evaluated.
    pub ignore_types: BTreeSet<String>,
    /// Programmatic skip predicate.
    pub skip_if: Option<SkipIf>,
}

impl CheckBase {
    /// Creates a base with empty ignore sets.
    #[must_use]
    pub fn new(id: CheckId, level: Level) -> Self {
        Self {
            id,
            level,
            ignore_objects: BTreeSet::new(),
            ignore_types: BTreeSet::new(),
            skip_if: None,
        }
    }

    /// Sets the ignored objects.
    #[must_use]
    pub fn with_ignore_objects(mut self, objects: BTreeSet<String>) -> Self {
        self.ignore_objects = objects;
        self
    }

    /// Sets the ignored types. Entries are canonicalized.
    #[must_use]
    pub fn with_ignore_types(mut self, types: impl IntoIterator<Item = String>) -> Self {
        self.ignore_types = types.into_iter().map(|t| django::canonical(&t)).collect();
        self
    }

    /// Sets the skip predicate.
    #[must_use]
    pub fn with_skip_if(mut self, skip_if: Option<SkipIf>) -> Self {
        self.skip_if = skip_if;
        self
    }

    /// Builds a diagnostic; the message gets the `[check-name]` suffix.
    #[must_use]
    pub fn message(&self, message: impl fmt::Display, hint: impl Into<String>) -> Diagnostic {
        Diagnostic::new(self.id, self.level, format!("{message} [{}]", self.id.name()))
            .with_hint(hint)
    }
}

/// A bound check: one per enabled identity.
#[derive(Debug)]
pub struct CheckUnit {
    base: CheckBase,
    kind: CheckKind,
}

impl CheckUnit {
    /// Binds `kind` with `base`.
    #[must_use]
    pub fn new(base: CheckBase, kind: CheckKind) -> Self {
        Self { base, kind }
    }

    /// The check identity.
    #[must_use]
    pub fn id(&self) -> CheckId {
        self.base.id
    }

    /// Resolved settings.
    #[must_use]
    pub fn base(&self) -> &CheckBase {
        &self.base
    }

    /// Target granularity.
    #[must_use]
    pub fn kind(&self) -> &CheckKind {
        &self.kind
    }

    /// Whether `target` must not be evaluated.
    #[must_use]
    pub fn is_ignored(&self, target: &Target<'_>) -> bool {
        if self
            .base
            .skip_if
            .as_ref()
            .is_some_and(|skip| skip.matches(target))
        {
            return true;
        }
        target
            .object_key()
            .is_some_and(|key| self.base.ignore_objects.contains(key))
            || target
                .type_path()
                .is_some_and(|path| self.base.ignore_types.contains(path))
    }

    /// Evaluates `target` unless ignored and drops diagnostics disabled by
    /// a comment at the target's relevant source line.
    ///
    /// `view` is the source view of the class declaring the target; a
    /// field's view is the one of the class whose body declares it.
    #[must_use]
    pub fn invoke(&self, target: &Target<'_>, view: Option<&ClassView<'_>>, project: &Project) -> Vec<Diagnostic> {
        if self.is_ignored(target) {
            debug!(check = self.id().code(), object = ?target.object_key(), "Ignored");
            return Vec::new();
        }

        let id = self.id();
        let (diagnostics, disabled, location) = match (&self.kind, target, view) {
            (CheckKind::Model(check), Target::Model(model), Some(view)) => {
                let meta_scoped = id.is_model_meta_scoped();
                (
                    check.apply(&self.base, model, view, project),
                    view.is_disabled_for_class(id, meta_scoped),
                    class_or_meta_location(view, meta_scoped),
                )
            }
            (CheckKind::Field(check), Target::Field { model, field }, Some(view)) => {
                let source = view.field(&field.name, field.is_related());
                match check.apply(&self.base, model, field, &source) {
                    Ok(diagnostics) => (
                        diagnostics,
                        source.is_disabled_by_comment(id),
                        source.location().or_else(|| view.class_location()),
                    ),
                    Err(e) => {
                        debug!(check = id.code(), model = %model.path, "{e}");
                        return Vec::new();
                    }
                }
            }
            (CheckKind::Serializer(check), Target::Serializer(serializer), Some(view)) => {
                let meta_scoped = check.scope() == SerializerScope::ModelMeta;
                (
                    check.apply(&self.base, serializer),
                    view.is_disabled_for_class(id, meta_scoped),
                    class_or_meta_location(view, meta_scoped),
                )
            }
            (CheckKind::Config(check), Target::Config(config), _) => {
                (check.apply(&self.base, config), false, None)
            }
            _ => {
                debug!(check = id.code(), "Target kind does not match the check");
                return Vec::new();
            }
        };

        let object = target.object_ref();
        diagnostics
            .into_iter()
            .filter(|d| !(disabled && d.id == id))
            .map(|mut d| {
                if d.object.is_none() {
                    d.object.clone_from(&object);
                }
                if d.location.is_none() {
                    d.location.clone_from(&location);
                }
                d
            })
            .collect()
    }
}

fn class_or_meta_location(view: &ClassView<'_>, meta_scoped: bool) -> Option<Location> {
    if meta_scoped {
        if let Some(line) = view.meta_line() {
            let indent = view
                .source()
                .and_then(|s| s.line(line))
                .map_or(0, |text| text.len() - text.trim_start().len());
            return view.file_position(line, indent);
        }
    }
    view.class_location()
}
