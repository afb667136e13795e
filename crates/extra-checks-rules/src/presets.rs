//! Check presets for common configurations.

use extra_checks_core::CheckId;
use serde_json::{json, Value};

/// Preset configurations for extra-checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Recommended checks with sensible defaults.
    Recommended,
    /// Strict checks, including translation and admin conventions.
    Strict,
    /// Minimal checks for gradual adoption.
    Minimal,
}

impl Preset {
    /// Every preset.
    pub const ALL: &'static [Preset] = &[Preset::Minimal, Preset::Recommended, Preset::Strict];

    /// Stable external name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Strict => "strict",
            Self::Minimal => "minimal",
        }
    }

    /// Looks a preset up by name.
    #[must_use]
    pub fn find(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name.trim())
    }

    /// Entries of the `checks` list.
    #[must_use]
    pub fn checks(self) -> Vec<Value> {
        match self {
            Self::Recommended => recommended_checks(),
            Self::Strict => strict_checks(),
            Self::Minimal => minimal_checks(),
        }
    }

    /// The checks document of this preset.
    #[must_use]
    pub fn document(self) -> Value {
        json!({ "checks": self.checks() })
    }

    /// The `checks` list as a TOML assignment, one entry per line.
    #[must_use]
    pub fn to_toml(self) -> String {
        let mut out = String::from("checks = [\n");
        for entry in self.checks() {
            out.push_str("    ");
            out.push_str(&toml_literal(&entry));
            out.push_str(",\n");
        }
        out.push(']');
        out
    }
}

fn name(id: CheckId) -> Value {
    Value::String(id.name().to_owned())
}

/// Returns the minimal set of checks.
///
/// Only checks that read the indexed field options:
/// - `field-null` (X057)
/// - `field-text-null` (X055)
/// - `field-default-null` (X059)
/// - `field-file-upload-to` (X054)
#[must_use]
pub fn minimal_checks() -> Vec<Value> {
    [CheckId::X057, CheckId::X055, CheckId::X059, CheckId::X054]
        .into_iter()
        .map(name)
        .collect()
}

/// Returns the recommended set of checks.
///
/// Includes all minimal checks plus translation, relation, constraint and
/// serializer checks.
#[must_use]
pub fn recommended_checks() -> Vec<Value> {
    let mut checks = minimal_checks();
    checks.extend(
        [
            CheckId::X051,
            CheckId::X053,
            CheckId::X058,
            CheckId::X060,
            CheckId::X061,
            CheckId::X013,
            CheckId::X014,
            CheckId::X301,
        ]
        .into_iter()
        .map(name),
    );
    checks
}

/// Returns the strict set of checks.
///
/// Includes all recommended checks plus:
/// - `field-verbose-name` and `field-verbose-name-gettext-case`
/// - `model-admin`
/// - `field-foreign-key-db-index` with `when = "always"`
/// - required `Meta` attributes on models and model serializers
#[must_use]
pub fn strict_checks() -> Vec<Value> {
    let mut checks: Vec<Value> = recommended_checks()
        .into_iter()
        .filter(|entry| entry.as_str() != Some(CheckId::X058.name()))
        .collect();
    checks.extend([CheckId::X050, CheckId::X052, CheckId::X012].into_iter().map(name));
    checks.push(json!({"id": CheckId::X058.name(), "when": "always"}));
    checks.push(json!({"id": CheckId::X011.name(), "attrs": ["verbose_name", "verbose_name_plural"]}));
    checks.push(json!({"id": CheckId::X302.name(), "attrs": ["fields"]}));
    checks
}

/// Inline TOML rendering of a JSON value.
fn toml_literal(value: &Value) -> String {
    match value {
        Value::Null => "\"\"".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(toml_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{k} = {}", toml_literal(v))).collect();
            format!("{{ {} }}", pairs.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extra_checks_core::{IgnoreRegistry, Settings};

    #[test]
    fn presets_bind_cleanly() {
        for preset in Preset::ALL {
            let controller = crate::default_registry().bind(&Settings::new(preset.document()), &IgnoreRegistry::new());
            assert!(controller.is_healthy(), "{} preset is invalid", preset.name());
            assert_eq!(controller.enabled_checks().len(), preset.checks().len() + 1);
        }
    }

    #[test]
    fn strict_overrides_foreign_key_mode() {
        let checks = Preset::Strict.checks();
        let mentions = checks
            .iter()
            .filter(|e| e.as_str() == Some("field-foreign-key-db-index") || e["id"] == "field-foreign-key-db-index")
            .count();
        assert_eq!(mentions, 1);
    }

    #[test]
    fn minimal_toml() {
        insta::assert_snapshot!(Preset::Minimal.to_toml(), @r#"
        checks = [
            "field-null",
            "field-text-null",
            "field-default-null",
            "field-file-upload-to",
        ]
        "#);
    }

    #[test]
    fn find_by_name() {
        assert_eq!(Preset::find("strict"), Some(Preset::Strict));
        assert_eq!(Preset::find("lenient"), None);
    }
}
