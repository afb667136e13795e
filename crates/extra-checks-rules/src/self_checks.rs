//! Configuration health check (X001).
//!
//! # Rationale
//!
//! A broken configuration must never stop the project from being checked
//! silently. Resolution failures are reported as one CRITICAL diagnostic
//! whose hint lists every broken key.

use extra_checks_core::{Check, CheckBase, CheckId, ChecksConfig, ConfigCheck, Diagnostic, Level};

/// Reports configuration resolution errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigHealth;

impl ConfigHealth {
    /// Creates the check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for ConfigHealth {
    fn id(&self) -> CheckId {
        CheckId::X001
    }

    fn default_level(&self) -> Level {
        Level::Critical
    }
}

impl ConfigCheck for ConfigHealth {
    fn apply(&self, base: &CheckBase, config: &ChecksConfig) -> Vec<Diagnostic> {
        let Some(errors) = config.errors() else {
            return Vec::new();
        };
        let details = if errors.is_empty() {
            "No details.".to_owned()
        } else {
            errors.render()
        };
        vec![base.message(
            "Invalid EXTRA_CHECKS config.",
            format!("Fix EXTRA_CHECKS in your settings. Errors:\n{details}"),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extra_checks_core::{IgnoreRegistry, Settings};
    use serde_json::json;

    fn config(document: serde_json::Value) -> ChecksConfig {
        let schemas = crate::default_registry().schemas();
        ChecksConfig::create(&Settings::new(document), &schemas, &IgnoreRegistry::new())
    }

    #[test]
    fn healthy_config_is_silent() {
        let base = CheckBase::new(CheckId::X001, Level::Critical);
        let config = config(json!({"checks": ["field-null"]}));
        assert!(ConfigHealth::new().apply(&base, &config).is_empty());
    }

    #[test]
    fn broken_config_is_critical() {
        let base = CheckBase::new(CheckId::X001, Level::Critical);
        let config = config(json!({"checks": [{"id": "model-attribute"}]}));

        let found = ConfigHealth::new().apply(&base, &config);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Invalid EXTRA_CHECKS config. [extra-checks-config]");
        insta::assert_snapshot!(found[0].hint.as_deref().unwrap_or_default(), @r"
        Fix EXTRA_CHECKS in your settings. Errors:
        * checks
          * model-attribute
            * attrs
              * This field is required.
        ");
    }
}
