//! # extra-checks-rules
//!
//! Built-in checks for Django models and Django REST framework serializers.
//!
//! ## Available Checks
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | X001 | `extra-checks-config` | Reports an invalid configuration document |
//! | X010 | `model-attribute` | Models must define the configured attributes |
//! | X011 | `model-meta-attribute` | Models must define the configured `Meta` options |
//! | X012 | `model-admin` | Concrete models must be registered in admin |
//! | X013 | `no-unique-together` | Use `UniqueConstraint` instead of `unique_together` |
//! | X014 | `no-index-together` | Use `Meta.indexes` instead of `index_together` |
//! | X050 | `field-verbose-name` | Fields must set a verbose name |
//! | X051 | `field-verbose-name-gettext` | Verbose names must use gettext |
//! | X052 | `field-verbose-name-gettext-case` | Verbose name words use one case each |
//! | X053 | `field-help-text-gettext` | Help texts must use gettext |
//! | X054 | `field-file-upload-to` | File fields need a non-empty `upload_to` |
//! | X055 | `field-text-null` | No `null=True` on text fields |
//! | X056 | `field-boolean-null` | No `NullBooleanField` (deprecated check) |
//! | X057 | `field-null` | No explicit `null=False` |
//! | X058 | `field-foreign-key-db-index` | Foreign keys set `db_index` explicitly |
//! | X059 | `field-default-null` | No `default=None` next to `null=True` |
//! | X060 | `field-choices-constraint` | Choices are enforced by a `CheckConstraint` (autofix) |
//! | X061 | `field-related-name` | Related fields set `related_name` |
//! | X301 | `drf-model-serializer-extra-kwargs` | `extra_kwargs` must not repeat declared fields |
//! | X302 | `drf-model-serializer-meta-attribute` | Model serializer `Meta` defines the configured attributes |
//!
//! ## Usage
//!
//! ```
//! use extra_checks_core::{Project, Settings};
//! use extra_checks_rules::default_registry;
//!
//! let project = Project::from_sources(
//!     [("shop/models.py", "from django.db import models\n\nclass Item(models.Model):\n    image = models.ImageField()\n")],
//!     None,
//! )?;
//! let settings = Settings::new(serde_json::json!({"checks": ["field-file-upload-to"]}));
//! let controller = default_registry().bind(&settings, project.ignore_registry());
//! let found: Vec<_> = controller.run_all(&project, None).collect();
//! assert_eq!(found.len(), 1);
//! # Ok::<(), extra_checks_core::ProjectError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalogue;
mod choices_constraint;
mod drf_serializer_checks;
mod model_checks;
mod model_field_checks;
mod presets;
mod self_checks;

pub use catalogue::{catalogue, default_registry, entry};
pub use choices_constraint::FieldChoicesConstraint;
pub use drf_serializer_checks::{SerializerExtraKwargs, SerializerMetaAttribute};
pub use model_checks::{ModelAdmin, ModelAttribute, ModelMetaAttribute, NoIndexTogether, NoUniqueTogether};
pub use model_field_checks::{
    FieldDefaultNull, FieldFileUploadTo, FieldForeignKeyIndex, FieldHelpTextGettext, FieldNullBoolean, FieldNullFalse,
    FieldRelatedName, FieldTextNull, FieldVerboseName, FieldVerboseNameGettext, FieldVerboseNameGettextCase, IndexWhen,
};
pub use presets::{minimal_checks, recommended_checks, strict_checks, Preset};
pub use self_checks::ConfigHealth;

/// Re-export core types for convenience.
pub use extra_checks_core::{Check, CheckId, Diagnostic, Level};
