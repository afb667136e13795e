//! Static catalogue and the bind phase.
//!
//! A [`Registry`] is the unbound state: a table of catalogue entries and
//! one driver per group. [`Registry::bind`] resolves the settings once and
//! yields a [`Controller`], the bound state, which is the only thing that
//! can run checks.

use std::collections::BTreeMap;
use std::fmt;
use std::iter;

use tracing::{debug, info, warn};

use crate::check::{CheckBase, CheckKind, CheckUnit};
use crate::check_id::{CheckId, Tag};
use crate::config::{CheckSettings, ChecksConfig, Schema, Settings};
use crate::drivers;
use crate::ignore::IgnoreRegistry;
use crate::project::Project;
use crate::types::Diagnostic;

/// Enumerates the targets of one group and dispatches its units.
pub type Driver = for<'a> fn(
    &'a [CheckUnit],
    &'a ChecksConfig,
    &'a Project,
    Option<&'a [String]>,
) -> Box<dyn Iterator<Item = Diagnostic> + 'a>;

/// One row of the catalogue.
#[derive(Clone, Copy)]
pub struct CatalogueEntry {
    /// The check identity.
    pub id: CheckId,
    /// Groups the check runs in.
    pub tags: &'static [Tag],
    /// Settings schema used during resolution.
    pub schema: fn() -> Schema,
    /// Builds the check from validated settings.
    pub build: fn(&CheckSettings) -> CheckKind,
}

impl fmt::Debug for CatalogueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogueEntry")
            .field("id", &self.id)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// The unbound registry.
#[derive(Clone)]
pub struct Registry {
    entries: Vec<CatalogueEntry>,
    drivers: BTreeMap<Tag, Driver>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries)
            .field("drivers", &self.drivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty catalogue with the built-in group drivers.
    #[must_use]
    pub fn new() -> Self {
        let mut by_tag: BTreeMap<Tag, Driver> = BTreeMap::new();
        by_tag.insert(Tag::SelfCheck, drivers::self_check);
        by_tag.insert(Tag::Models, drivers::check_models);
        by_tag.insert(Tag::DrfSerializers, drivers::check_serializers);
        Self {
            entries: Vec::new(),
            drivers: by_tag,
        }
    }

    /// Adds a catalogue entry. A later entry with the same identity
    /// replaces the earlier one.
    #[must_use]
    pub fn register(mut self, entry: CatalogueEntry) -> Self {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.id == entry.id) {
            debug!(check = %entry.id, "Catalogue entry replaced");
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
        self
    }

    /// Replaces the driver of a group.
    #[must_use]
    pub fn driver(mut self, tag: Tag, driver: Driver) -> Self {
        self.drivers.insert(tag, driver);
        self
    }

    /// Catalogue entries, in registration order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    /// Settings schema of every catalogued check.
    #[must_use]
    pub fn schemas(&self) -> BTreeMap<CheckId, Schema> {
        self.entries.iter().map(|e| (e.id, (e.schema)())).collect()
    }

    /// Resolves `settings` and constructs the enabled checks.
    ///
    /// Only identities present in the resolved configuration get a unit.
    /// When resolution fails only the self-check is bound.
    #[must_use]
    pub fn bind(&self, settings: &Settings, ignore: &IgnoreRegistry) -> Controller {
        let config = ChecksConfig::create(settings, &self.schemas(), ignore);
        if !config.is_healthy() {
            warn!("Checks configuration is invalid, only the self-check is enabled");
        }

        let mut groups: BTreeMap<Tag, Vec<CheckUnit>> = BTreeMap::new();
        for entry in &self.entries {
            let Some(check_settings) = config.settings_for(entry.id) else {
                continue;
            };
            for &tag in entry.tags {
                if !self.drivers.contains_key(&tag) {
                    debug!(check = %entry.id, group = %tag, "Group has no driver");
                    continue;
                }
                let unit = build_unit(entry, check_settings, &config, settings);
                groups.entry(tag).or_default().push(unit);
            }
        }

        let controller = Controller {
            config,
            groups,
            drivers: self.drivers.clone(),
        };
        info!(
            healthy = controller.is_healthy(),
            checks = controller.enabled_checks().len(),
            groups = controller.groups.len(),
            "Checks bound"
        );
        controller
    }
}

fn build_unit(
    entry: &CatalogueEntry,
    check_settings: &CheckSettings,
    config: &ChecksConfig,
    settings: &Settings,
) -> CheckUnit {
    let kind = (entry.build)(check_settings);
    let check = kind.check();
    if let Some(note) = check.deprecation() {
        warn!(check = %entry.id, "{note}");
    }
    let level = check_settings.level.unwrap_or_else(|| check.default_level());
    let base = CheckBase::new(entry.id, level)
        .with_ignore_objects(config.ignored_objects(entry.id))
        .with_ignore_types(check_settings.ignore_types.iter().cloned())
        .with_skip_if(settings.skip_predicate(entry.id).cloned());
    CheckUnit::new(base, kind)
}

/// The bound registry.
pub struct Controller {
    config: ChecksConfig,
    groups: BTreeMap<Tag, Vec<CheckUnit>>,
    drivers: BTreeMap<Tag, Driver>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("healthy", &self.is_healthy())
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Whether configuration resolution succeeded.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.config.is_healthy()
    }

    /// The resolved configuration.
    #[must_use]
    pub fn config(&self) -> &ChecksConfig {
        &self.config
    }

    /// Groups with at least one enabled check, in execution order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.groups.keys().copied()
    }

    /// Units bound to `tag`.
    #[must_use]
    pub fn units(&self, tag: Tag) -> &[CheckUnit] {
        self.groups.get(&tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Identities with a bound unit, deduplicated and sorted.
    #[must_use]
    pub fn enabled_checks(&self) -> Vec<CheckId> {
        let mut ids: Vec<CheckId> = self
            .groups
            .values()
            .flatten()
            .map(CheckUnit::id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Runs one group lazily. Unbound groups yield nothing.
    ///
    /// `apps` restricts model checks to applications by name or label.
    pub fn run<'a>(
        &'a self,
        tag: Tag,
        project: &'a Project,
        apps: Option<&'a [String]>,
    ) -> Box<dyn Iterator<Item = Diagnostic> + 'a> {
        match (self.groups.get(&tag), self.drivers.get(&tag)) {
            (Some(units), Some(driver)) => driver(units, &self.config, project, apps),
            _ => Box::new(iter::empty()),
        }
    }

    /// Runs every bound group in order.
    pub fn run_all<'a>(
        &'a self,
        project: &'a Project,
        apps: Option<&'a [String]>,
    ) -> impl Iterator<Item = Diagnostic> + 'a {
        self.groups
            .keys()
            .flat_map(move |&tag| self.run(tag, project, apps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{Check, ConfigCheck, FieldCheck, ModelCheck};
    use crate::config::FieldKind;
    use crate::project::{Field, ModelClass};
    use crate::source::{ClassView, FieldSource, SourceUnavailable};
    use crate::types::Level;
    use serde_json::json;

    struct Config;

    impl Check for Config {
        fn id(&self) -> CheckId {
            CheckId::X001
        }
    }

    impl ConfigCheck for Config {
        fn apply(&self, base: &CheckBase, config: &ChecksConfig) -> Vec<Diagnostic> {
            if config.is_healthy() {
                Vec::new()
            } else {
                vec![base.message("Broken.", "")]
            }
        }
    }

    struct Attr(Vec<String>);

    impl Check for Attr {
        fn id(&self) -> CheckId {
            CheckId::X010
        }
    }

    impl ModelCheck for Attr {
        fn apply(&self, base: &CheckBase, model: &ModelClass, _: &ClassView<'_>, _: &Project) -> Vec<Diagnostic> {
            self.0
                .iter()
                .filter(|a| !model.has_attr(a))
                .map(|a| base.message(format!("Missing {a}."), ""))
                .collect()
        }
    }

    struct Deprecated;

    impl Check for Deprecated {
        fn id(&self) -> CheckId {
            CheckId::X056
        }

        fn deprecation(&self) -> Option<&'static str> {
            Some("deprecated")
        }
    }

    impl FieldCheck for Deprecated {
        fn apply(
            &self,
            base: &CheckBase,
            _: &ModelClass,
            _: &Field,
            _: &FieldSource<'_>,
        ) -> Result<Vec<Diagnostic>, SourceUnavailable> {
            Ok(vec![base.message("Field.", "")])
        }
    }

    fn registry() -> Registry {
        Registry::new()
            .register(CatalogueEntry {
                id: CheckId::X001,
                tags: &[Tag::SelfCheck],
                schema: Schema::new,
                build: |_| CheckKind::Config(Box::new(Config)),
            })
            .register(CatalogueEntry {
                id: CheckId::X010,
                tags: &[Tag::Models],
                schema: || Schema::new().required("attrs", FieldKind::StrList),
                build: |s| CheckKind::Model(Box::new(Attr(s.list("attrs")))),
            })
            .register(CatalogueEntry {
                id: CheckId::X056,
                tags: &[Tag::Models],
                schema: Schema::new,
                build: |_| CheckKind::Field(Box::new(Deprecated)),
            })
    }

    fn project() -> Project {
        Project::from_sources(
            [(
                "blog/models.py",
                "from django.db import models\n\nclass Post(models.Model):\n    title = models.CharField()\n",
            )],
            None,
        )
        .unwrap()
    }

    #[test]
    fn only_configured_checks_are_bound() {
        let settings = Settings::new(json!({"checks": [{"id": "model-attribute", "attrs": ["site"]}]}));
        let controller = registry().bind(&settings, &IgnoreRegistry::new());
        assert!(controller.is_healthy());
        assert_eq!(controller.enabled_checks(), vec![CheckId::X001, CheckId::X010]);
        assert_eq!(controller.tags().collect::<Vec<_>>(), vec![Tag::SelfCheck, Tag::Models]);
        assert!(controller.units(Tag::DrfSerializers).is_empty());
    }

    #[test]
    fn broken_config_binds_self_check_only() {
        let settings = Settings::new(json!({"checks": [{"id": "model-attribute"}]}));
        let controller = registry().bind(&settings, &IgnoreRegistry::new());
        assert!(!controller.is_healthy());
        assert_eq!(controller.enabled_checks(), vec![CheckId::X001]);

        let project = project();
        let found: Vec<_> = controller.run_all(&project, None).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, CheckId::X001);
    }

    #[test]
    fn run_is_ordered_model_then_fields() {
        let settings = Settings::new(json!({
            "level": "ERROR",
            "checks": ["field-boolean-null", {"id": "model-attribute", "attrs": ["site"]}],
        }));
        let controller = registry().bind(&settings, &IgnoreRegistry::new());
        let project = project();
        let found: Vec<_> = controller.run(Tag::Models, &project, None).collect();
        let codes: Vec<_> = found.iter().map(Diagnostic::code).collect();
        assert_eq!(codes, vec!["X010", "X056", "X056"]);
        assert!(found.iter().all(|d| d.level == Level::Error));
    }

    #[test]
    fn ignore_registry_feeds_units() {
        let mut ignore = IgnoreRegistry::new();
        ignore.register("blog.models.Post", ["model-attribute"]);
        let settings = Settings::new(json!({"checks": [{"id": "X010", "attrs": ["site"]}]}));
        let controller = registry().bind(&settings, &ignore);
        let project = project();
        assert_eq!(controller.run(Tag::Models, &project, None).count(), 0);
    }

    #[test]
    fn skip_predicate_is_attached() {
        let settings = Settings::new(json!({"checks": [{"id": "X010", "attrs": ["site"]}]}))
            .skip_if(CheckId::X010, |_| true);
        let controller = registry().bind(&settings, &IgnoreRegistry::new());
        let project = project();
        assert_eq!(controller.run_all(&project, None).count(), 0);
    }
}
