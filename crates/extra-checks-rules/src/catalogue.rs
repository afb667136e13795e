//! The static check catalogue.
//!
//! One [`CatalogueEntry`] per identity: its execution groups, its settings
//! schema and a constructor from validated settings. The table is built
//! once and only read afterwards.

use extra_checks_core::config::FieldKind;
use extra_checks_core::project::django;
use extra_checks_core::{CatalogueEntry, CheckId, CheckKind, CheckSettings, Registry, Schema, Tag};

use crate::choices_constraint::FieldChoicesConstraint;
use crate::drf_serializer_checks::{SerializerExtraKwargs, SerializerMetaAttribute};
use crate::model_checks::{ModelAdmin, ModelAttribute, ModelMetaAttribute, NoIndexTogether, NoUniqueTogether};
use crate::model_field_checks::{
    FieldDefaultNull, FieldFileUploadTo, FieldForeignKeyIndex, FieldHelpTextGettext, FieldNullBoolean, FieldNullFalse,
    FieldRelatedName, FieldTextNull, FieldVerboseName, FieldVerboseNameGettext, FieldVerboseNameGettextCase, IndexWhen,
};
use crate::self_checks::ConfigHealth;

const SELF_CHECK: &[Tag] = &[Tag::SelfCheck];
const MODELS: &[Tag] = &[Tag::Models];
const SERIALIZERS: &[Tag] = &[Tag::DrfSerializers];

fn attrs_schema() -> Schema {
    Schema::new().required("attrs", FieldKind::StrList)
}

fn meta_attrs_schema() -> Schema {
    Schema::new().required("attrs", FieldKind::MultiChoice(django::META_OPTIONS))
}

fn gettext_schema() -> Schema {
    Schema::new().optional("gettext_func", FieldKind::Str, None)
}

fn foreign_key_index_schema() -> Schema {
    Schema::new().optional("when", FieldKind::Choice(IndexWhen::CHOICES), Some("indexes"))
}

fn gettext_func(settings: &CheckSettings) -> &str {
    settings.str("gettext_func").unwrap_or_default()
}

/// Every known check, in identity order.
#[must_use]
pub fn catalogue() -> Vec<CatalogueEntry> {
    CheckId::ALL.iter().map(|&id| entry(id)).collect()
}

/// The catalogue entry of `id`.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn entry(id: CheckId) -> CatalogueEntry {
    match id {
        CheckId::X001 => CatalogueEntry {
            id,
            tags: SELF_CHECK,
            schema: Schema::new,
            build: |_| CheckKind::Config(Box::new(ConfigHealth::new())),
        },
        CheckId::X010 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: attrs_schema,
            build: |s| CheckKind::Model(Box::new(ModelAttribute::new(s.list("attrs")))),
        },
        CheckId::X011 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: meta_attrs_schema,
            build: |s| CheckKind::Model(Box::new(ModelMetaAttribute::new(s.list("attrs")))),
        },
        CheckId::X012 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Model(Box::new(ModelAdmin)),
        },
        CheckId::X013 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Model(Box::new(NoUniqueTogether)),
        },
        CheckId::X014 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Model(Box::new(NoIndexTogether)),
        },
        CheckId::X050 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Field(Box::new(FieldVerboseName)),
        },
        CheckId::X051 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: gettext_schema,
            build: |s| CheckKind::Field(Box::new(FieldVerboseNameGettext::new().gettext_func(gettext_func(s)))),
        },
        CheckId::X052 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: gettext_schema,
            build: |s| CheckKind::Field(Box::new(FieldVerboseNameGettextCase::new().gettext_func(gettext_func(s)))),
        },
        CheckId::X053 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: gettext_schema,
            build: |s| CheckKind::Field(Box::new(FieldHelpTextGettext::new().gettext_func(gettext_func(s)))),
        },
        CheckId::X054 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Field(Box::new(FieldFileUploadTo)),
        },
        CheckId::X055 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Field(Box::new(FieldTextNull)),
        },
        CheckId::X056 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Field(Box::new(FieldNullBoolean)),
        },
        CheckId::X057 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Field(Box::new(FieldNullFalse)),
        },
        CheckId::X058 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: foreign_key_index_schema,
            build: |s| {
                let when = IndexWhen::parse(s.str("when").unwrap_or_default());
                CheckKind::Field(Box::new(FieldForeignKeyIndex::new().when(when)))
            },
        },
        CheckId::X059 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Field(Box::new(FieldDefaultNull)),
        },
        CheckId::X060 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Field(Box::new(FieldChoicesConstraint::new())),
        },
        CheckId::X061 => CatalogueEntry {
            id,
            tags: MODELS,
            schema: Schema::new,
            build: |_| CheckKind::Field(Box::new(FieldRelatedName)),
        },
        CheckId::X301 => CatalogueEntry {
            id,
            tags: SERIALIZERS,
            schema: Schema::new,
            build: |_| CheckKind::Serializer(Box::new(SerializerExtraKwargs)),
        },
        CheckId::X302 => CatalogueEntry {
            id,
            tags: SERIALIZERS,
            schema: attrs_schema,
            build: |s| CheckKind::Serializer(Box::new(SerializerMetaAttribute::new(s.list("attrs")))),
        },
    }
}

/// A registry holding the full catalogue and the built-in drivers.
#[must_use]
pub fn default_registry() -> Registry {
    catalogue().into_iter().fold(Registry::new(), Registry::register)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extra_checks_core::Check;

    #[test]
    fn every_identity_has_an_entry() {
        let entries = catalogue();
        assert_eq!(entries.len(), CheckId::ALL.len());
        assert!(entries.iter().zip(CheckId::ALL).all(|(e, id)| e.id == *id));
    }

    #[test]
    fn built_checks_report_their_identity() {
        let settings = CheckSettings::default();
        for entry in catalogue() {
            assert_eq!((entry.build)(&settings).check().id(), entry.id);
        }
    }

    #[test]
    fn groups_partition_the_catalogue() {
        let tagged = |tag: Tag| catalogue().iter().filter(|e| e.tags.contains(&tag)).count();
        assert_eq!(tagged(Tag::SelfCheck), 1);
        assert_eq!(tagged(Tag::Models), 17);
        assert_eq!(tagged(Tag::DrfSerializers), 2);
    }

    #[test]
    fn configurable_checks_expose_their_keys() {
        let schemas = default_registry().schemas();
        let keys = |id: CheckId| schemas[&id].keys().collect::<Vec<_>>();
        assert_eq!(keys(CheckId::X010), vec!["attrs"]);
        assert_eq!(keys(CheckId::X051), vec!["gettext_func"]);
        assert_eq!(keys(CheckId::X058), vec!["when"]);
        assert!(keys(CheckId::X054).is_empty());
    }
}
