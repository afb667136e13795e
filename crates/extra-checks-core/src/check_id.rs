//! Check identities and execution groups.

use serde::{Serialize, Serializer};
use std::fmt;

macro_rules! check_ids {
    ($( $variant:ident => $name:literal, $summary:literal; )*) => {
        /// Closed set of check identities.
        ///
        /// Each identity has a public name (used in configuration and
        /// disable-comments) and a short code (used as diagnostic id).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum CheckId {
            $( #[doc = $summary] $variant, )*
        }

        impl CheckId {
            /// Every identity, in catalogue order.
            pub const ALL: &'static [CheckId] = &[ $( CheckId::$variant, )* ];

            /// Short code, e.g. `X050`.
            #[must_use]
            pub fn code(self) -> &'static str {
                match self { $( Self::$variant => stringify!($variant), )* }
            }

            /// Public name, e.g. `field-verbose-name`.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self { $( Self::$variant => $name, )* }
            }

            /// One-line description for listings.
            #[must_use]
            pub fn summary(self) -> &'static str {
                match self { $( Self::$variant => $summary, )* }
            }
        }
    };
}

check_ids! {
    X001 => "extra-checks-config", "Configuration document must be valid";
    X010 => "model-attribute", "Models must define the configured attributes";
    X011 => "model-meta-attribute", "Models must define the configured Meta options";
    X012 => "model-admin", "Concrete models must be registered in admin";
    X013 => "no-unique-together", "Use UniqueConstraint instead of unique_together";
    X014 => "no-index-together", "Use Meta.indexes instead of index_together";
    X050 => "field-verbose-name", "Fields must set a verbose name";
    X051 => "field-verbose-name-gettext", "Verbose names must be wrapped in gettext";
    X052 => "field-verbose-name-gettext-case", "Verbose name words must be all lower or all upper case";
    X053 => "field-help-text-gettext", "Help texts must be wrapped in gettext";
    X054 => "field-file-upload-to", "File fields must set a non-empty upload_to";
    X055 => "field-text-null", "Text fields must not use null=True";
    X056 => "field-boolean-null", "Use BooleanField(null=True) instead of NullBooleanField";
    X057 => "field-null", "Do not pass the default null=False";
    X058 => "field-foreign-key-db-index", "ForeignKey fields must set db_index explicitly";
    X059 => "field-default-null", "Do not pass default=None together with null=True";
    X060 => "field-choices-constraint", "Fields with choices need a CheckConstraint";
    X061 => "field-related-name", "Related fields must set related_name";
    X301 => "drf-model-serializer-extra-kwargs", "extra_kwargs must not repeat declared serializer fields";
    X302 => "drf-model-serializer-meta-attribute", "ModelSerializer Meta must define the configured attributes";
}

impl CheckId {
    /// Looks an identity up by public name or short code.
    ///
    /// Surrounding whitespace is ignored; unknown input yields `None`.
    #[must_use]
    pub fn find(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.name() == value || id.code() == value)
    }

    /// Identities whose relevant source line is the model's `class Meta`.
    #[must_use]
    pub fn is_model_meta_scoped(self) -> bool {
        matches!(self, Self::X011 | Self::X013 | Self::X014)
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for CheckId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Execution group a check is registered under.
///
/// Groups run independently; a group without enabled checks is never bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    /// Configuration health check.
    SelfCheck,
    /// Model and model-field checks.
    Models,
    /// Django REST framework serializer checks.
    DrfSerializers,
}

impl Tag {
    /// Every group, in execution order.
    pub const ALL: &'static [Tag] = &[Tag::SelfCheck, Tag::Models, Tag::DrfSerializers];

    /// Stable external name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SelfCheck => "extra_checks_selfcheck",
            Self::Models => "models",
            Self::DrfSerializers => "extra_checks_drf_serializer",
        }
    }

    /// Looks a group up by external name, accepting short aliases.
    #[must_use]
    pub fn find(value: &str) -> Option<Self> {
        match value.trim() {
            "extra_checks_selfcheck" | "selfcheck" => Some(Self::SelfCheck),
            "models" => Some(Self::Models),
            "extra_checks_drf_serializer" | "drf" | "serializers" => Some(Self::DrfSerializers),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_by_name_or_code() {
        assert_eq!(CheckId::find("field-verbose-name"), Some(CheckId::X050));
        assert_eq!(CheckId::find("X050"), Some(CheckId::X050));
        assert_eq!(CheckId::find("  model-admin "), Some(CheckId::X012));
    }

    #[test]
    fn find_unknown_returns_none() {
        assert_eq!(CheckId::find("X000"), None);
        assert_eq!(CheckId::find(""), None);
        assert_eq!(CheckId::find("field-verbose"), None);
    }

    #[test]
    fn names_and_codes_are_unique() {
        let mut names: Vec<&str> = CheckId::ALL.iter().map(|c| c.name()).collect();
        let mut codes: Vec<&str> = CheckId::ALL.iter().map(|c| c.code()).collect();
        names.sort_unstable();
        names.dedup();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(names.len(), CheckId::ALL.len());
        assert_eq!(codes.len(), CheckId::ALL.len());
    }

    #[test]
    fn tag_aliases() {
        assert_eq!(Tag::find("drf"), Some(Tag::DrfSerializers));
        assert_eq!(Tag::find("models"), Some(Tag::Models));
        assert_eq!(Tag::find("admin"), None);
    }
}
