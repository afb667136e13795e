//! Field-level checks (X050 to X059, X061).
//!
//! # Rationale
//!
//! Django normalizes field arguments at class creation: a missing
//! `verbose_name` is derived from the attribute name, `null=False` looks the
//! same whether it was passed or not. Checks that care about how a field was
//! *written* read the declaration through [`FieldSource`]; the rest work on
//! the indexed [`Field`] alone.
//!
//! # Configuration
//!
//! - gettext checks: `gettext_func`, the name of the translation function
//!   (default `_`)
//! - `field-foreign-key-db-index`: `when`, `indexes` (default) or `always`

use extra_checks_core::project::{Field, FieldDefault, ModelClass};
use extra_checks_core::{Check, CheckBase, CheckId, Diagnostic, FieldCheck, FieldSource, SourceUnavailable};

const DEFAULT_GETTEXT_FUNC: &str = "_";

fn field_message(base: &CheckBase, message: impl std::fmt::Display, hint: &str) -> Result<Vec<Diagnostic>, SourceUnavailable> {
    Ok(vec![base.message(message, hint)])
}

fn none() -> Result<Vec<Diagnostic>, SourceUnavailable> {
    Ok(Vec::new())
}

/// Requires an explicit verbose name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldVerboseName;

impl Check for FieldVerboseName {
    fn id(&self) -> CheckId {
        CheckId::X050
    }
}

impl FieldCheck for FieldVerboseName {
    fn apply(&self, base: &CheckBase, _: &ModelClass, _: &Field, source: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        if source.get_arg("verbose_name")?.is_some() {
            return none();
        }
        field_message(base, "Field has no verbose name.", "Set verbose name on the field.")
    }
}

macro_rules! gettext_check {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            gettext_func: String,
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            /// Creates the check with the `_` translation function.
            #[must_use]
            pub fn new() -> Self {
                Self {
                    gettext_func: DEFAULT_GETTEXT_FUNC.to_owned(),
                }
            }

            /// Sets the translation function name; empty names keep `_`.
            #[must_use]
            pub fn gettext_func(mut self, name: &str) -> Self {
                if !name.is_empty() {
                    self.gettext_func = name.to_owned();
                }
                self
            }

            fn is_gettext(&self, arg: &extra_checks_core::ArgView<'_>) -> bool {
                arg.is_callable() && arg.callable_func_name() == Some(self.gettext_func.as_str())
            }
        }
    };
}

gettext_check! {
    /// Requires verbose names to be wrapped in the translation function.
    FieldVerboseNameGettext
}

gettext_check! {
    /// Requires translated verbose names to use one case per word.
    FieldVerboseNameGettextCase
}

gettext_check! {
    /// Requires help texts to be wrapped in the translation function.
    FieldHelpTextGettext
}

impl Check for FieldVerboseNameGettext {
    fn id(&self) -> CheckId {
        CheckId::X051
    }
}

impl FieldCheck for FieldVerboseNameGettext {
    fn apply(&self, base: &CheckBase, _: &ModelClass, _: &Field, source: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        match source.get_arg("verbose_name")? {
            Some(arg) if !self.is_gettext(&arg) => {
                field_message(base, "Verbose name should use gettext.", "Use gettext on the verbose name.")
            }
            _ => none(),
        }
    }
}

/// A word passes when it has cased letters all in one case, or when it
/// is made of digits only. Empty words, from repeated spaces, fail.
fn is_single_case(word: &str) -> bool {
    if !word.is_empty() && word.chars().all(|c| c.is_numeric()) {
        return true;
    }
    let cased: Vec<char> = word.chars().filter(|c| c.is_lowercase() || c.is_uppercase()).collect();
    !cased.is_empty() && (cased.iter().all(|c| c.is_lowercase()) || cased.iter().all(|c| c.is_uppercase()))
}

impl Check for FieldVerboseNameGettextCase {
    fn id(&self) -> CheckId {
        CheckId::X052
    }
}

impl FieldCheck for FieldVerboseNameGettextCase {
    fn apply(&self, base: &CheckBase, _: &ModelClass, _: &Field, source: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        let Some(arg) = source.get_arg("verbose_name")? else {
            return none();
        };
        if !self.is_gettext(&arg) {
            return none();
        }
        match arg.first_str_arg() {
            Some(value) if !value.is_empty() && !value.split(' ').all(is_single_case) => field_message(
                base,
                "Words in verbose name must be all upper case or all lower case.",
                &format!("Change verbose name to \"{}\".", value.to_lowercase()),
            ),
            _ => none(),
        }
    }
}

impl Check for FieldHelpTextGettext {
    fn id(&self) -> CheckId {
        CheckId::X053
    }
}

impl FieldCheck for FieldHelpTextGettext {
    fn apply(&self, base: &CheckBase, _: &ModelClass, _: &Field, source: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        match source.get_arg("help_text")? {
            Some(arg) if !self.is_gettext(&arg) => {
                field_message(base, "Help text should use gettext.", "Use gettext on the help text.")
            }
            _ => none(),
        }
    }
}

/// Requires file fields to set a non-empty `upload_to`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldFileUploadTo;

impl Check for FieldFileUploadTo {
    fn id(&self) -> CheckId {
        CheckId::X054
    }
}

impl FieldCheck for FieldFileUploadTo {
    fn apply(&self, base: &CheckBase, _: &ModelClass, field: &Field, _: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        if !field.is_instance("FileField") || field.upload_to {
            return none();
        }
        field_message(
            base,
            format!("Field \"{}\" must have non empty \"upload_to\" attribute.", field.name),
            "Set \"upload_to\" on the field.",
        )
    }
}

/// Forbids `null=True` on text fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldTextNull;

impl Check for FieldTextNull {
    fn id(&self) -> CheckId {
        CheckId::X055
    }
}

impl FieldCheck for FieldTextNull {
    fn apply(&self, base: &CheckBase, _: &ModelClass, field: &Field, _: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        let is_text = field.is_instance("CharField") || field.is_instance("TextField");
        if !is_text || !field.is_null() {
            return none();
        }
        field_message(
            base,
            format!(
                "Field \"{}\" shouldn't use `null=True` (django uses empty string for text fields).",
                field.name
            ),
            "Remove `null=True` attribute from the field.",
        )
    }
}

/// Forbids `NullBooleanField`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldNullBoolean;

impl Check for FieldNullBoolean {
    fn id(&self) -> CheckId {
        CheckId::X056
    }

    fn deprecation(&self) -> Option<&'static str> {
        Some("`field-boolean-null` check is deprecated and will be removed in version 0.14.0")
    }
}

impl FieldCheck for FieldNullBoolean {
    fn apply(&self, base: &CheckBase, _: &ModelClass, field: &Field, _: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        if !field.is_instance("NullBooleanField") {
            return none();
        }
        field_message(
            base,
            format!("Field \"{}\" should be `BooleanField` with attribute `null=True`.", field.name),
            "Replace `NullBooleanField` by `BooleanField` with attribute `null=True`.",
        )
    }
}

/// Forbids passing the default `null=False`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldNullFalse;

impl Check for FieldNullFalse {
    fn id(&self) -> CheckId {
        CheckId::X057
    }
}

impl FieldCheck for FieldNullFalse {
    fn apply(&self, base: &CheckBase, _: &ModelClass, field: &Field, source: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        if field.null != Some(false) || source.get_arg("null")?.is_none() {
            return none();
        }
        field_message(base, "Argument `null=False` is default.", "Remove `null=False` from field arguments.")
    }
}

/// When a foreign key must set `db_index` explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexWhen {
    /// Only when the field appears in `Meta` indexes or uniqueness options.
    #[default]
    Indexes,
    /// Always.
    Always,
}

impl IndexWhen {
    /// Accepted option values.
    pub const CHOICES: &'static [&'static str] = &["indexes", "always"];

    /// Parses an option value; unknown values fall back to `indexes`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "always" => Self::Always,
            _ => Self::Indexes,
        }
    }
}

/// Requires foreign keys to set `db_index` explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldForeignKeyIndex {
    when: IndexWhen,
}

impl FieldForeignKeyIndex {
    /// Creates the check in `indexes` mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mode.
    #[must_use]
    pub fn when(mut self, when: IndexWhen) -> Self {
        self.when = when;
        self
    }
}

impl Check for FieldForeignKeyIndex {
    fn id(&self) -> CheckId {
        CheckId::X058
    }
}

impl FieldCheck for FieldForeignKeyIndex {
    fn apply(&self, base: &CheckBase, model: &ModelClass, field: &Field, source: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        if !field.is_related() || !field.many_to_one() || source.get_arg("db_index")?.is_some() {
            return none();
        }
        match self.when {
            IndexWhen::Indexes if model.meta.index_field_names().contains(&field.name) => field_message(
                base,
                "ForeignKey field must set `db_index` explicitly if it present in other indexes.",
                "Specify `db_index` field argument.",
            ),
            IndexWhen::Indexes => none(),
            IndexWhen::Always => {
                field_message(base, "ForeignKey must set `db_index` explicitly.", "Specify `db_index` field argument.")
            }
        }
    }
}

/// Forbids the redundant `default=None` next to `null=True`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldDefaultNull;

impl Check for FieldDefaultNull {
    fn id(&self) -> CheckId {
        CheckId::X059
    }
}

impl FieldCheck for FieldDefaultNull {
    fn apply(&self, base: &CheckBase, _: &ModelClass, field: &Field, source: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        if !field.is_null() || field.default != FieldDefault::None || source.get_arg("default")?.is_none() {
            return none();
        }
        field_message(
            base,
            "Argument `default=None` is redundant if `null=True` is set. (see docs about exceptions).",
            "Remove `default=None` from field arguments.",
        )
    }
}

/// Requires related fields to set `related_name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldRelatedName;

impl Check for FieldRelatedName {
    fn id(&self) -> CheckId {
        CheckId::X061
    }
}

impl FieldCheck for FieldRelatedName {
    fn apply(&self, base: &CheckBase, _: &ModelClass, field: &Field, _: &FieldSource<'_>) -> Result<Vec<Diagnostic>, SourceUnavailable> {
        if !field.is_related() || field.related_name.as_deref().is_some_and(|name| !name.is_empty()) {
            return none();
        }
        field_message(
            base,
            "Related fields must set `related_name` explicitly.",
            "Specify `related_name` field argument. Use `related_name='+'` to not create a backwards relation.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extra_checks_core::project::Project;
    use extra_checks_core::{ClassView, Level};

    fn project(body: &str) -> Project {
        let source = format!(
            "from django.db import models\nfrom django.utils.translation import gettext_lazy as _\n\n\nclass Item(models.Model):\n{body}"
        );
        Project::from_sources([("shop/models.py", source)], None).unwrap()
    }

    fn apply(check: &dyn FieldCheck, id: CheckId, body: &str, name: &str) -> Vec<String> {
        let project = project(body);
        let model = project.model("shop.models.Item").unwrap();
        let field = model.field(name).unwrap();
        let view = ClassView::new(project.provider(), model.location.clone());
        let source = view.field(&field.name, field.is_related());
        check
            .apply(&CheckBase::new(id, Level::Warning), model, field, &source)
            .unwrap()
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    // ── Source-based checks ──

    #[test]
    fn verbose_name_positional_or_keyword() {
        let body = "    a = models.CharField(\"a\")\n    b = models.CharField(verbose_name=_(\"b\"))\n    c = models.CharField(max_length=3)\n    d = models.ForeignKey(\"Other\", models.CASCADE)\n";
        assert!(apply(&FieldVerboseName, CheckId::X050, body, "a").is_empty());
        assert!(apply(&FieldVerboseName, CheckId::X050, body, "b").is_empty());
        assert_eq!(apply(&FieldVerboseName, CheckId::X050, body, "c").len(), 1);
        assert_eq!(apply(&FieldVerboseName, CheckId::X050, body, "d").len(), 1);
    }

    #[test]
    fn verbose_name_gettext_function_is_configurable() {
        let body = "    a = models.CharField(_(\"a\"))\n    b = models.CharField(gettext(\"b\"))\n    c = models.CharField()\n";
        let check = FieldVerboseNameGettext::new();
        assert!(apply(&check, CheckId::X051, body, "a").is_empty());
        assert_eq!(
            apply(&check, CheckId::X051, body, "b"),
            vec!["Verbose name should use gettext. [field-verbose-name-gettext]"]
        );
        assert!(apply(&check, CheckId::X051, body, "c").is_empty());

        let check = FieldVerboseNameGettext::new().gettext_func("gettext");
        assert!(apply(&check, CheckId::X051, body, "b").is_empty());
        assert_eq!(apply(&check, CheckId::X051, body, "a").len(), 1);
    }

    #[test]
    fn verbose_name_words_use_one_case() {
        let body = "    a = models.CharField(_(\"Item name\"))\n    b = models.CharField(_(\"item URL 2\"))\n    c = models.CharField(\"Item name\")\n";
        let check = FieldVerboseNameGettextCase::new();
        assert_eq!(apply(&check, CheckId::X052, body, "a").len(), 1);
        assert!(apply(&check, CheckId::X052, body, "b").is_empty());
        assert!(apply(&check, CheckId::X052, body, "c").is_empty());
    }

    #[test]
    fn single_case_words() {
        assert!(is_single_case("name"));
        assert!(is_single_case("URL"));
        assert!(is_single_case("42"));
        assert!(is_single_case("e-mail"));
        assert!(!is_single_case(""));
        assert!(!is_single_case("-"));
        assert!(!is_single_case("Name"));
        assert!(!is_single_case("iPhone"));
    }

    #[test]
    fn verbose_name_with_repeated_spaces_fails() {
        let body = "    a = models.CharField(_(\"item  name\"))\n    b = models.CharField(_(\"item name \"))\n";
        let check = FieldVerboseNameGettextCase::new();
        assert_eq!(apply(&check, CheckId::X052, body, "a").len(), 1);
        assert_eq!(apply(&check, CheckId::X052, body, "b").len(), 1);
    }

    #[test]
    fn help_text_needs_gettext() {
        let body = "    a = models.CharField(help_text=\"plain text\")\n    b = models.CharField(help_text=_(\"plain text\"))\n";
        let check = FieldHelpTextGettext::new();
        assert_eq!(apply(&check, CheckId::X053, body, "a").len(), 1);
        assert!(apply(&check, CheckId::X053, body, "b").is_empty());
    }

    #[test]
    fn explicit_null_false() {
        let body = "    a = models.IntegerField(null=False)\n    b = models.IntegerField()\n    c = models.IntegerField(null=True)\n";
        assert_eq!(apply(&FieldNullFalse, CheckId::X057, body, "a").len(), 1);
        assert!(apply(&FieldNullFalse, CheckId::X057, body, "b").is_empty());
        assert!(apply(&FieldNullFalse, CheckId::X057, body, "c").is_empty());
    }

    #[test]
    fn foreign_key_index_modes() {
        let body = "    owner = models.ForeignKey(\"auth.User\", models.CASCADE)\n    shop = models.ForeignKey(\"Shop\", models.CASCADE)\n    tag = models.ForeignKey(\"Tag\", models.CASCADE, db_index=True)\n\n    class Meta:\n        indexes = [models.Index(fields=[\"-owner\"])]\n";
        let check = FieldForeignKeyIndex::new();
        assert_eq!(apply(&check, CheckId::X058, body, "owner").len(), 1);
        assert!(apply(&check, CheckId::X058, body, "shop").is_empty());

        let check = FieldForeignKeyIndex::new().when(IndexWhen::Always);
        assert_eq!(
            apply(&check, CheckId::X058, body, "shop"),
            vec!["ForeignKey must set `db_index` explicitly. [field-foreign-key-db-index]"]
        );
        assert!(apply(&check, CheckId::X058, body, "tag").is_empty());
    }

    #[test]
    fn redundant_default_none() {
        let body = "    a = models.IntegerField(null=True, default=None)\n    b = models.IntegerField(default=None)\n    c = models.IntegerField(null=True)\n";
        assert_eq!(apply(&FieldDefaultNull, CheckId::X059, body, "a").len(), 1);
        assert!(apply(&FieldDefaultNull, CheckId::X059, body, "b").is_empty());
        assert!(apply(&FieldDefaultNull, CheckId::X059, body, "c").is_empty());
    }

    // ── Index-based checks ──

    #[test]
    fn file_fields_need_upload_to() {
        let body = "    a = models.FileField()\n    b = models.ImageField(upload_to=\"images/\")\n    c = models.FileField(upload_to=\"\")\n";
        assert_eq!(
            apply(&FieldFileUploadTo, CheckId::X054, body, "a"),
            vec!["Field \"a\" must have non empty \"upload_to\" attribute. [field-file-upload-to]"]
        );
        assert!(apply(&FieldFileUploadTo, CheckId::X054, body, "b").is_empty());
        assert_eq!(apply(&FieldFileUploadTo, CheckId::X054, body, "c").len(), 1);
    }

    #[test]
    fn text_fields_without_null() {
        let body = "    a = models.EmailField(null=True)\n    b = models.TextField()\n    c = models.IntegerField(null=True)\n";
        assert_eq!(apply(&FieldTextNull, CheckId::X055, body, "a").len(), 1);
        assert!(apply(&FieldTextNull, CheckId::X055, body, "b").is_empty());
        assert!(apply(&FieldTextNull, CheckId::X055, body, "c").is_empty());
    }

    #[test]
    fn null_boolean_field() {
        let body = "    a = models.NullBooleanField()\n    b = models.BooleanField(null=True)\n";
        assert_eq!(apply(&FieldNullBoolean, CheckId::X056, body, "a").len(), 1);
        assert!(apply(&FieldNullBoolean, CheckId::X056, body, "b").is_empty());
        assert!(FieldNullBoolean.deprecation().is_some());
    }

    #[test]
    fn related_fields_need_related_name() {
        let body = "    a = models.ForeignKey(\"Shop\", models.CASCADE)\n    b = models.ManyToManyField(\"Tag\", related_name=\"+\")\n    c = models.CharField()\n";
        assert_eq!(apply(&FieldRelatedName, CheckId::X061, body, "a").len(), 1);
        assert!(apply(&FieldRelatedName, CheckId::X061, body, "b").is_empty());
        assert!(apply(&FieldRelatedName, CheckId::X061, body, "c").is_empty());
    }

    #[test]
    fn missing_source_is_reported_as_unavailable() {
        let project = project("    a = models.CharField()\n");
        let model = project.model("shop.models.Item").unwrap();
        let field = model.field("a").unwrap();
        let view = ClassView::new(project.provider(), None);
        let source = view.field(&field.name, false);
        let base = CheckBase::new(CheckId::X050, Level::Warning);
        assert!(FieldVerboseName.apply(&base, model, field, &source).is_err());
        assert!(FieldTextNull.apply(&base, model, field, &source).unwrap().is_empty());
    }
}
