//! Explicit opt-out registrations.
//!
//! ```
//! use extra_checks_core::IgnoreRegistry;
//!
//! let mut registry = IgnoreRegistry::new();
//! IgnoreRegistry::ignore_checks(["field-verbose-name", "X061"])
//!     .apply(&mut registry, "blog.models.Post");
//! assert!(!registry.is_empty());
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::check_id::CheckId;

/// Objects that must never be evaluated against some checks.
///
/// Objects are keyed by their dotted path (see [`crate::Target::object_key`]).
/// Identities are kept raw until [`IgnoreRegistry::resolve`] so that a typo
/// surfaces as a configuration error instead of being dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRegistry {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl IgnoreRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registration that can be applied to any number of objects.
    pub fn ignore_checks<I, S>(ids: I) -> IgnoreRegistration
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IgnoreRegistration {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Records `object` as ignored for `ids`.
    pub fn register<I, S>(&mut self, object: impl Into<String>, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(object.into())
            .or_default()
            .extend(ids.into_iter().map(Into::into));
    }

    /// Adds every registration of `other`.
    pub fn merge(&mut self, other: &IgnoreRegistry) {
        for (object, ids) in &other.entries {
            self.register(object.clone(), ids.iter().cloned());
        }
    }

    /// Returns true if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inverts the registry into identity to ignored objects.
    ///
    /// # Errors
    ///
    /// Returns one message per unknown identity.
    pub fn resolve(&self) -> Result<BTreeMap<CheckId, BTreeSet<String>>, Vec<String>> {
        let mut ignored: BTreeMap<CheckId, BTreeSet<String>> = BTreeMap::new();
        let mut errors = Vec::new();
        for (object, ids) in &self.entries {
            for raw in ids {
                match CheckId::find(raw) {
                    Some(id) => {
                        ignored.entry(id).or_default().insert(object.clone());
                    }
                    None => errors.push(format!(
                        "Unknown check ({raw}) provided to the ignore registration"
                    )),
                }
            }
        }
        if errors.is_empty() {
            Ok(ignored)
        } else {
            Err(errors)
        }
    }
}

/// A pending registration; see [`IgnoreRegistry::ignore_checks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRegistration {
    ids: Vec<String>,
}

impl IgnoreRegistration {
    /// Records `object` in `registry`.
    pub fn apply(&self, registry: &mut IgnoreRegistry, object: impl Into<String>) {
        registry.register(object, self.ids.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_resolves_by_name_and_code() {
        let mut registry = IgnoreRegistry::new();
        let registration = IgnoreRegistry::ignore_checks(["field-null", "X061"]);
        registration.apply(&mut registry, "blog.models.Post");
        registration.apply(&mut registry, "blog.models.Tag");

        let resolved = registry.resolve().unwrap();
        assert_eq!(resolved[&CheckId::X057].len(), 2);
        assert!(resolved[&CheckId::X061].contains("blog.models.Tag"));
    }

    #[test]
    fn unknown_ids_are_itemized() {
        let mut registry = IgnoreRegistry::new();
        registry.register("a.B", ["nope", "X050"]);
        assert_eq!(
            registry.resolve().unwrap_err(),
            vec!["Unknown check (nope) provided to the ignore registration"]
        );
    }

    #[test]
    fn merge_unions_entries() {
        let mut a = IgnoreRegistry::new();
        a.register("a.B", ["X050"]);
        let mut b = IgnoreRegistry::new();
        b.register("a.B", ["X051"]);
        a.merge(&b);
        let resolved = a.resolve().unwrap();
        assert!(resolved.contains_key(&CheckId::X050));
        assert!(resolved.contains_key(&CheckId::X051));
    }
}
