//! A full bind and run pass.
//!
//! [`Runner`] ties the pieces together: it indexes the project, merges the
//! ignore registrations found in source with the caller's own, binds the
//! built-in catalogue and collects every surviving diagnostic into a
//! [`Report`].

use extra_checks_core::{
    CheckId, ConfigFile, IgnoreRegistry, Project, ProjectConfig, ProjectError, Report, Settings, Tag,
    Target,
};
use extra_checks_rules::default_registry;
use tracing::{debug, info};

/// Runs the built-in checks over a project.
#[derive(Debug, Clone)]
pub struct Runner {
    project: ProjectConfig,
    settings: Settings,
    ignore: IgnoreRegistry,
    tags: Vec<Tag>,
    apps: Option<Vec<String>>,
}

impl Runner {
    /// Creates a runner for the project described by `project`.
    #[must_use]
    pub fn new(project: ProjectConfig, settings: Settings) -> Self {
        Self {
            project,
            settings,
            ignore: IgnoreRegistry::new(),
            tags: Vec::new(),
            apps: None,
        }
    }

    /// Creates a runner from a loaded configuration file.
    ///
    /// Without a checks document only the configuration self-check runs.
    #[must_use]
    pub fn from_config(config: &ConfigFile) -> Self {
        let settings = config
            .document
            .clone()
            .map_or_else(Settings::empty, Settings::new);
        Self::new(config.project.clone(), settings)
    }

    /// Restricts the run to the given groups.
    ///
    /// The configuration self-check always runs so that a broken document
    /// is never silent.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Restricts model checks to the given applications (name or label).
    #[must_use]
    pub fn apps(mut self, apps: impl IntoIterator<Item = String>) -> Self {
        self.apps.get_or_insert_with(Vec::new).extend(apps);
        self
    }

    /// Adds ignore registrations on top of those declared in source.
    #[must_use]
    pub fn ignore(mut self, registry: &IgnoreRegistry) -> Self {
        self.ignore.merge(registry);
        self
    }

    /// Attaches a skip predicate to a check.
    #[must_use]
    pub fn skip_if(
        mut self,
        id: CheckId,
        predicate: impl Fn(&Target<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.settings = self.settings.skip_if(id, predicate);
        self
    }

    /// Project discovery settings.
    #[must_use]
    pub fn project_config(&self) -> &ProjectConfig {
        &self.project
    }

    /// Indexes the project from disk and runs the checks.
    ///
    /// The indexed project is returned alongside the report so callers can
    /// read sources again, e.g. to apply fixes.
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be indexed.
    pub fn check(&self) -> Result<(Project, Report), ProjectError> {
        let project = Project::load(&self.project)?;
        let report = self.run(&project);
        Ok((project, report))
    }

    /// Runs the checks over an already indexed project.
    #[must_use]
    pub fn run(&self, project: &Project) -> Report {
        let mut ignore = project.ignore_registry().clone();
        ignore.merge(&self.ignore);

        let controller = default_registry().bind(&self.settings, &ignore);
        let apps = self.apps.as_deref();

        let diagnostics = if self.tags.is_empty() {
            controller.run_all(project, apps).collect()
        } else {
            let selected: Vec<Tag> = Tag::ALL
                .iter()
                .copied()
                .filter(|tag| *tag == Tag::SelfCheck || self.tags.contains(tag))
                .collect();
            debug!("Running groups: {selected:?}");
            selected
                .into_iter()
                .flat_map(|tag| controller.run(tag, project, apps))
                .collect::<Vec<_>>()
        };

        let report = Report {
            diagnostics,
            healthy: controller.is_healthy(),
        };
        info!("{} ({project:?})", report.summary());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extra_checks_core::Level;
    use serde_json::json;

    const MODELS: &str = "\
from django.db import models


class Book(models.Model):
    cover = models.ImageField()
    title = models.CharField(null=True)
";

    fn project() -> Project {
        Project::from_sources([("library/models.py", MODELS)], None).unwrap()
    }

    fn runner(document: serde_json::Value) -> Runner {
        Runner::new(ProjectConfig::default(), Settings::new(document))
    }

    #[test]
    fn runs_every_bound_group() {
        let report = runner(json!({"checks": ["field-file-upload-to", "field-text-null"]})).run(&project());
        assert!(report.healthy);
        let codes: Vec<&str> = report.diagnostics.iter().map(|d| d.code()).collect();
        assert_eq!(codes, vec!["X054", "X055"]);
    }

    #[test]
    fn without_document_nothing_is_reported() {
        let report = Runner::new(ProjectConfig::default(), Settings::empty()).run(&project());
        assert!(report.healthy);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn tag_filter_keeps_the_self_check() {
        let report = runner(json!({"checks": ["field-text-null", {"id": "bogus"}]}))
            .tags([Tag::DrfSerializers])
            .run(&project());
        assert!(!report.healthy);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].level, Level::Critical);
    }

    #[test]
    fn tag_filter_skips_other_groups() {
        let report = runner(json!({"checks": ["field-text-null"]}))
            .tags([Tag::DrfSerializers])
            .run(&project());
        assert!(report.healthy);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn extra_ignore_registrations_apply() {
        let mut ignore = IgnoreRegistry::new();
        ignore.register("library.models.Book", ["X054"]);
        let report = runner(json!({"checks": ["field-file-upload-to"]}))
            .ignore(&ignore)
            .run(&project());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn unknown_extra_ignore_identity_is_a_config_error() {
        let mut ignore = IgnoreRegistry::new();
        ignore.register("library.models.Book", ["X999"]);
        let report = runner(json!({"checks": ["field-file-upload-to"]}))
            .ignore(&ignore)
            .run(&project());
        assert!(!report.healthy);
        assert_eq!(report.diagnostics[0].id, CheckId::X001);
    }

    #[test]
    fn app_filter_restricts_models() {
        let report = runner(json!({"checks": ["field-file-upload-to"]}))
            .apps(["blog".to_owned()])
            .run(&project());
        assert!(report.diagnostics.is_empty());
    }
}
