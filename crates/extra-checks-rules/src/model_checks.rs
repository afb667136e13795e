//! Model-level checks (X010 to X014).
//!
//! # Rationale
//!
//! Project conventions often require every concrete model to expose some
//! attributes (`get_absolute_url`, a custom manager) or `Meta` options
//! (`verbose_name`, `ordering`). Abstract and proxy models are exempt: they
//! have no table of their own.
//!
//! # Configuration
//!
//! - `model-attribute`: `attrs`, the attribute names every model must have
//! - `model-meta-attribute`: `attrs`, Meta option names every model must set

use std::collections::BTreeSet;

use extra_checks_core::project::{django, ModelClass, Project};
use extra_checks_core::{Check, CheckBase, CheckId, ClassView, Diagnostic, ModelCheck};

/// Meta option names assigned in the model's own `Meta`.
///
/// Falls back to the indexed options when the class has no source.
fn own_meta_names(model: &ModelClass, view: &ClassView<'_>) -> BTreeSet<String> {
    if view.has_source() {
        view.meta_names().into_iter().map(String::from).collect()
    } else {
        model.meta.options.clone()
    }
}

/// Requires attributes on every concrete model.
#[derive(Debug, Clone, Default)]
pub struct ModelAttribute {
    attrs: Vec<String>,
}

impl ModelAttribute {
    /// Creates the check.
    #[must_use]
    pub fn new(attrs: Vec<String>) -> Self {
        Self { attrs }
    }
}

impl Check for ModelAttribute {
    fn id(&self) -> CheckId {
        CheckId::X010
    }
}

impl ModelCheck for ModelAttribute {
    fn apply(&self, base: &CheckBase, model: &ModelClass, _: &ClassView<'_>, _: &Project) -> Vec<Diagnostic> {
        if !model.is_concrete() {
            return Vec::new();
        }
        self.attrs
            .iter()
            .filter(|attr| !model.has_attr(attr))
            .map(|attr| {
                base.message(
                    format!("Each model must specify \"{attr}\" attribute."),
                    format!("Set \"{attr}\" attribute."),
                )
            })
            .collect()
    }
}

/// Requires `Meta` options on every concrete model.
#[derive(Debug, Clone, Default)]
pub struct ModelMetaAttribute {
    attrs: Vec<String>,
}

impl ModelMetaAttribute {
    /// Creates the check. Names outside [`django::META_OPTIONS`] are
    /// rejected by the settings schema before this point.
    #[must_use]
    pub fn new(attrs: Vec<String>) -> Self {
        Self { attrs }
    }

    /// Accepted option names.
    #[must_use]
    pub fn choices() -> &'static [&'static str] {
        django::META_OPTIONS
    }
}

impl Check for ModelMetaAttribute {
    fn id(&self) -> CheckId {
        CheckId::X011
    }
}

impl ModelCheck for ModelMetaAttribute {
    fn apply(&self, base: &CheckBase, model: &ModelClass, view: &ClassView<'_>, _: &Project) -> Vec<Diagnostic> {
        if !model.is_concrete() {
            return Vec::new();
        }
        let names = own_meta_names(model, view);
        self.attrs
            .iter()
            .filter(|attr| !names.contains(attr.as_str()))
            .map(|attr| {
                base.message(
                    format!("Each model must specify \"{attr}\" attribute in its Meta."),
                    format!("Set \"{attr}\" attribute in Meta."),
                )
            })
            .collect()
    }
}

/// Requires concrete models to be registered in the admin site.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelAdmin;

impl Check for ModelAdmin {
    fn id(&self) -> CheckId {
        CheckId::X012
    }
}

impl ModelCheck for ModelAdmin {
    fn apply(&self, base: &CheckBase, model: &ModelClass, _: &ClassView<'_>, project: &Project) -> Vec<Diagnostic> {
        if !model.is_concrete() || project.is_registered_in_admin(model) {
            return Vec::new();
        }
        vec![base.message(
            "Model must be registered in admin.",
            "Register the model in admin.py with `admin.site.register` or `@admin.register`.",
        )]
    }
}

/// Forbids `Meta.unique_together`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUniqueTogether;

impl Check for NoUniqueTogether {
    fn id(&self) -> CheckId {
        CheckId::X013
    }
}

impl ModelCheck for NoUniqueTogether {
    fn apply(&self, base: &CheckBase, model: &ModelClass, view: &ClassView<'_>, _: &Project) -> Vec<Diagnostic> {
        if !own_meta_names(model, view).contains("unique_together") {
            return Vec::new();
        }
        vec![base.message(
            "Meta.unique_together is deprecated, use UniqueConstraint.",
            "Replace `unique_together` by `Meta.constraints` with `models.UniqueConstraint`.",
        )]
    }
}

/// Forbids `Meta.index_together`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndexTogether;

impl Check for NoIndexTogether {
    fn id(&self) -> CheckId {
        CheckId::X014
    }
}

impl ModelCheck for NoIndexTogether {
    fn apply(&self, base: &CheckBase, model: &ModelClass, view: &ClassView<'_>, _: &Project) -> Vec<Diagnostic> {
        if !own_meta_names(model, view).contains("index_together") {
            return Vec::new();
        }
        vec![base.message(
            "Meta.index_together is deprecated.",
            "Replace `index_together` by `Meta.indexes`.",
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extra_checks_core::Level;

    const SOURCE: &str = "\
from django.db import models


class Base(models.Model):
    class Meta:
        abstract = True


class Article(Base):
    title = models.CharField()

    class Meta:
        verbose_name = \"article\"
        unique_together = [(\"title\",)]


class Proxy(Article):
    class Meta:
        proxy = True
";

    fn project() -> Project {
        Project::from_sources([("news/models.py", SOURCE)], None).unwrap()
    }

    fn run(check: &dyn ModelCheck, id: CheckId, project: &Project, path: &str) -> Vec<Diagnostic> {
        let model = project.model(path).unwrap();
        let view = ClassView::new(project.provider(), model.location.clone());
        check.apply(&CheckBase::new(id, Level::Warning), model, &view, project)
    }

    #[test]
    fn attributes_are_required_on_concrete_models() {
        let project = project();
        let check = ModelAttribute::new(vec!["get_absolute_url".into(), "objects".into()]);
        let found = run(&check, CheckId::X010, &project, "news.models.Article");
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].message,
            "Each model must specify \"get_absolute_url\" attribute. [model-attribute]"
        );
        assert!(run(&check, CheckId::X010, &project, "news.models.Base").is_empty());
        assert!(run(&check, CheckId::X010, &project, "news.models.Proxy").is_empty());
    }

    #[test]
    fn meta_options_come_from_own_meta() {
        let project = project();
        let check = ModelMetaAttribute::new(vec!["verbose_name".into(), "ordering".into()]);
        let found = run(&check, CheckId::X011, &project, "news.models.Article");
        let hints: Vec<_> = found.iter().filter_map(|d| d.hint.as_deref()).collect();
        assert_eq!(hints, vec!["Set \"ordering\" attribute in Meta."]);
    }

    #[test]
    fn unregistered_models_are_reported() {
        let project = project();
        let found = run(&ModelAdmin, CheckId::X012, &project, "news.models.Article");
        assert_eq!(found.len(), 1);
        assert!(run(&ModelAdmin, CheckId::X012, &project, "news.models.Proxy").is_empty());
    }

    #[test]
    fn together_options_are_reported() {
        let project = project();
        assert_eq!(run(&NoUniqueTogether, CheckId::X013, &project, "news.models.Article").len(), 1);
        assert!(run(&NoIndexTogether, CheckId::X014, &project, "news.models.Article").is_empty());
    }
}
