//! Django REST framework serializer checks (X301, X302).
//!
//! Both run on model serializers and are suppressed by a disable-comment
//! above the serializer's `class Meta`.
//!
//! # Configuration
//!
//! - `drf-model-serializer-meta-attribute`: `attrs`, names every model
//!   serializer `Meta` must define

use extra_checks_core::project::SerializerClass;
use extra_checks_core::{Check, CheckBase, CheckId, Diagnostic, Level, SerializerCheck, SerializerScope};

/// Forbids `extra_kwargs` entries for fields declared on the serializer.
///
/// Such entries are silently ignored by DRF.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializerExtraKwargs;

impl Check for SerializerExtraKwargs {
    fn id(&self) -> CheckId {
        CheckId::X301
    }

    fn default_level(&self) -> Level {
        Level::Error
    }
}

impl SerializerCheck for SerializerExtraKwargs {
    fn scope(&self) -> SerializerScope {
        SerializerScope::ModelMeta
    }

    fn apply(&self, base: &CheckBase, serializer: &SerializerClass) -> Vec<Diagnostic> {
        if !serializer.meta_has("extra_kwargs") {
            return Vec::new();
        }
        let invalid: Vec<&str> = serializer
            .extra_kwargs
            .intersection(&serializer.declared_fields)
            .map(String::as_str)
            .collect();
        if invalid.is_empty() {
            return Vec::new();
        }
        vec![base.message(
            "extra_kwargs mustn't include fields that declared on serializer.",
            format!("Remove extra_kwargs for fields: {}", invalid.join(", ")),
        )]
    }
}

/// Requires attributes in every model serializer `Meta`.
#[derive(Debug, Clone, Default)]
pub struct SerializerMetaAttribute {
    attrs: Vec<String>,
}

impl SerializerMetaAttribute {
    /// Creates the check.
    #[must_use]
    pub fn new(attrs: Vec<String>) -> Self {
        Self { attrs }
    }
}

impl Check for SerializerMetaAttribute {
    fn id(&self) -> CheckId {
        CheckId::X302
    }
}

impl SerializerCheck for SerializerMetaAttribute {
    fn scope(&self) -> SerializerScope {
        SerializerScope::ModelMeta
    }

    fn apply(&self, base: &CheckBase, serializer: &SerializerClass) -> Vec<Diagnostic> {
        self.attrs
            .iter()
            .filter(|attr| !serializer.meta_has(attr))
            .map(|attr| {
                base.message(
                    format!("ModelSerializer must define `{attr}` in Meta."),
                    format!("Add `{attr}` to serializer's Meta."),
                )
            })
            .collect()
    }
}
