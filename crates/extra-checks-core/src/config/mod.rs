//! Configuration resolution.
//!
//! The checks document is a nested JSON-like value:
//!
//! ```text
//! {
//!   "include_apps": ["blog"],          // optional
//!   "level": "WARNING",                // optional, fills entries without a level
//!   "checks": [
//!     "field-verbose-name",            // bare name: default settings
//!     {"id": "model-attribute", "attrs": ["site"]},
//!   ],
//! }
//! ```
//!
//! [`resolve`] validates it against the catalogue's [`Schema`]s and yields
//! either per-check [`CheckSettings`] or an [`ErrorTree`]. Validation is
//! atomic: one bad entry fails the whole document.

mod errors;
mod file;
mod schema;

pub use errors::{ErrorNode, ErrorTree};
pub use file::{ConfigError, ConfigFile, ProjectConfig, CONFIG_FILE_NAMES};
pub use schema::{CheckSettings, FieldErrors, FieldKind, Schema};

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::check::Target;
use crate::check_id::CheckId;
use crate::ignore::IgnoreRegistry;
use schema::{display_value, string_list};

/// A programmatic skip predicate attached to one check.
#[derive(Clone)]
pub struct SkipIf(Arc<dyn Fn(&Target<'_>) -> bool + Send + Sync>);

impl SkipIf {
    /// Wraps a predicate.
    pub fn new(predicate: impl Fn(&Target<'_>) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn matches(&self, target: &Target<'_>) -> bool {
        (self.0)(target)
    }
}

impl std::fmt::Debug for SkipIf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SkipIf(..)")
    }
}

/// User settings handed to the bind phase.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    document: Option<Value>,
    skip_if: HashMap<CheckId, SkipIf>,
}

impl Settings {
    /// Settings backed by a checks document.
    #[must_use]
    pub fn new(document: Value) -> Self {
        Self {
            document: Some(document),
            skip_if: HashMap::new(),
        }
    }

    /// Settings without a document; only the self-check is enabled.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attaches a skip predicate to a check.
    #[must_use]
    pub fn skip_if(
        mut self,
        id: CheckId,
        predicate: impl Fn(&Target<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.skip_if.insert(id, SkipIf::new(predicate));
        self
    }

    /// The raw checks document.
    #[must_use]
    pub fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }

    /// The skip predicate of a check, if any.
    #[must_use]
    pub fn skip_predicate(&self, id: CheckId) -> Option<&SkipIf> {
        self.skip_if.get(&id)
    }
}

/// Successfully resolved checks document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolved {
    /// Enabled checks and their validated settings.
    pub checks: BTreeMap<CheckId, CheckSettings>,
    /// Applications to restrict checks to. `None` when the key was absent.
    pub include_apps: Option<Vec<String>>,
}

/// Resolves a checks document against the catalogue schemas.
///
/// Duplicate check entries resolve to the last occurrence. Entries whose
/// identity has no schema are dropped.
///
/// # Errors
///
/// Returns the error tree when any part of the document is invalid.
pub fn resolve(
    document: &Value,
    schemas: &BTreeMap<CheckId, Schema>,
) -> Result<Resolved, ErrorTree> {
    let mut errors = ErrorTree::new();
    let Value::Object(root) = document else {
        errors.add("__all__", "Must be a dict.");
        return Err(errors);
    };

    let include_apps = match root.get("include_apps").map(string_list) {
        None => None,
        Some(Ok(apps)) => Some(apps),
        Some(Err(msg)) => {
            errors.add("include_apps", msg);
            None
        }
    };

    let default_level = match root.get("level") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) if value.as_str().is_some_and(|s| crate::Level::NAMES.contains(&s)) => {
            Some(value.clone())
        }
        Some(value) => {
            errors.add(
                "level",
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    display_value(value)
                ),
            );
            None
        }
    };

    let entries = match root.get("checks") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => normalize_entries(items, &mut errors),
        Some(_) => {
            errors.add("checks", "Enter a list of values.");
            Vec::new()
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut normalized: BTreeMap<CheckId, Map<String, Value>> = BTreeMap::new();
    for (id, kwargs) in entries {
        if normalized.insert(id, kwargs).is_some() {
            debug!(check = %id, "Duplicate check entry, last one wins");
        }
    }

    let mut checks = BTreeMap::new();
    let mut check_errors = ErrorTree::new();
    for (id, mut kwargs) in normalized {
        let Some(schema) = schemas.get(&id) else {
            debug!(check = %id, "No schema registered, entry dropped");
            continue;
        };
        if let Some(level) = &default_level {
            let missing = kwargs
                .get("level")
                .map_or(true, |l| l.is_null() || l.as_str() == Some(""));
            if missing {
                kwargs.insert("level".into(), level.clone());
            }
        }
        match schema.validate(&kwargs) {
            Ok(settings) => {
                checks.insert(id, settings);
            }
            Err(field_errors) => {
                let mut tree = ErrorTree::new();
                for (field, messages) in field_errors {
                    for message in messages {
                        tree.add(field.clone(), message);
                    }
                }
                check_errors.nest(id.name(), tree);
            }
        }
    }

    if !check_errors.is_empty() {
        errors.nest("checks", check_errors);
        return Err(errors);
    }

    Ok(Resolved {
        checks,
        include_apps,
    })
}

fn normalize_entries(
    items: &[Value],
    errors: &mut ErrorTree,
) -> Vec<(CheckId, Map<String, Value>)> {
    let mut entries = Vec::new();
    for item in items {
        match item {
            Value::String(name) => match CheckId::find(name) {
                Some(id) => entries.push((id, Map::new())),
                None => errors.add("checks", format!("{name} is not one of the available checks.")),
            },
            Value::Object(map) if map.is_empty() => errors.add("checks", "This field is required."),
            Value::Object(map) => {
                let Some(raw) = map.get("id") else {
                    errors.add("checks", "`id` field is required.");
                    continue;
                };
                match raw.as_str().and_then(CheckId::find) {
                    Some(id) => entries.push((id, map.clone())),
                    None => errors.add(
                        "checks",
                        format!("ID {} is not one of the available checks.", display_value(raw)),
                    ),
                }
            }
            other => errors.add(
                "checks",
                format!("{} is not one of the available types.", display_value(other)),
            ),
        }
    }
    entries
}

/// The bound configuration: the outcome of resolution plus the ignore
/// registrations. The self-check is always enabled.
#[derive(Debug, Clone)]
pub struct ChecksConfig {
    checks: BTreeMap<CheckId, CheckSettings>,
    include_apps: Option<Vec<String>>,
    errors: Option<ErrorTree>,
    ignored_objects: BTreeMap<CheckId, BTreeSet<String>>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self::from_parts(BTreeMap::new(), None, None, BTreeMap::new())
    }
}

impl ChecksConfig {
    fn from_parts(
        mut checks: BTreeMap<CheckId, CheckSettings>,
        include_apps: Option<Vec<String>>,
        errors: Option<ErrorTree>,
        ignored_objects: BTreeMap<CheckId, BTreeSet<String>>,
    ) -> Self {
        checks.entry(CheckId::X001).or_default();
        Self {
            checks,
            include_apps,
            errors,
            ignored_objects,
        }
    }

    /// Resolves `settings` against `schemas` and `ignore`.
    #[must_use]
    pub fn create(
        settings: &Settings,
        schemas: &BTreeMap<CheckId, Schema>,
        ignore: &IgnoreRegistry,
    ) -> Self {
        let Some(document) = settings.document() else {
            return Self::default();
        };
        let resolved = match resolve(document, schemas) {
            Ok(resolved) => resolved,
            Err(errors) => return Self::from_parts(BTreeMap::new(), None, Some(errors), BTreeMap::new()),
        };
        match ignore.resolve() {
            Ok(ignored) => Self::from_parts(resolved.checks, resolved.include_apps, None, ignored),
            Err(messages) => {
                let mut errors = ErrorTree::new();
                for message in messages {
                    errors.add("__all__", message);
                }
                Self::from_parts(BTreeMap::new(), None, Some(errors), BTreeMap::new())
            }
        }
    }

    /// Whether resolution succeeded.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.errors.is_none()
    }

    /// The error tree of a failed resolution.
    #[must_use]
    pub fn errors(&self) -> Option<&ErrorTree> {
        self.errors.as_ref()
    }

    /// Enabled checks with their settings.
    #[must_use]
    pub fn checks(&self) -> &BTreeMap<CheckId, CheckSettings> {
        &self.checks
    }

    /// Settings of one enabled check.
    #[must_use]
    pub fn settings_for(&self, id: CheckId) -> Option<&CheckSettings> {
        self.checks.get(&id)
    }

    /// Applications checks are restricted to.
    #[must_use]
    pub fn include_apps(&self) -> Option<&[String]> {
        self.include_apps.as_deref()
    }

    /// Objects registered as ignored for `id`.
    #[must_use]
    pub fn ignored_objects(&self, id: CheckId) -> BTreeSet<String> {
        self.ignored_objects.get(&id).cloned().unwrap_or_default()
    }
}
