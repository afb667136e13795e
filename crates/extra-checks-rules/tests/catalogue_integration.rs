//! Integration tests: the full catalogue bound against in-memory projects.

use extra_checks_core::{apply_replacements, CheckId, Diagnostic, Level, Project, Settings, Tag};
use extra_checks_rules::default_registry;
use serde_json::{json, Value};

const MODELS_HEADER: &str = "\
from django.db import models
from django.utils.translation import gettext_lazy as _


";

fn project(files: &[(&str, &str)]) -> Project {
    Project::from_sources(files.iter().map(|(p, t)| (*p, *t)), None).unwrap()
}

fn models(body: &str) -> Project {
    let text = format!("{MODELS_HEADER}{body}");
    Project::from_sources([("shop/models.py", text)], None).unwrap()
}

fn run(project: &Project, document: Value) -> Vec<Diagnostic> {
    let controller = default_registry().bind(&Settings::new(document), project.ignore_registry());
    controller.run_all(project, None).collect()
}

fn summary(found: &[Diagnostic]) -> Vec<(&'static str, String)> {
    found
        .iter()
        .map(|d| (d.code(), d.object.as_ref().map(ToString::to_string).unwrap_or_default()))
        .collect()
}

// ── Scenarios ──

#[test]
fn empty_upload_to_is_reported_once() {
    let project = models(
        "\
class Document(models.Model):
    scan = models.FileField()
    signed = models.FileField(upload_to=\"signed/\")
",
    );
    let found = run(&project, json!({"checks": ["field-file-upload-to"]}));
    assert_eq!(summary(&found), vec![("X054", "shop.Document.scan".to_owned())]);
    assert_eq!(found[0].id, CheckId::X054);
}

#[test]
fn meta_attribute_skips_abstract_models() {
    let project = models(
        "\
class Base(models.Model):
    class Meta:
        abstract = True


class Order(Base):
    class Meta:
        ordering = [\"id\"]
",
    );
    let found = run(&project, json!({"checks": [{"id": "model-meta-attribute", "attrs": ["db_table"]}]}));
    assert_eq!(summary(&found), vec![("X011", "shop.Order".to_owned())]);
    assert_eq!(found[0].message, "Each model must specify \"db_table\" attribute in its Meta. [model-meta-attribute]");
}

#[test]
fn unknown_meta_option_is_a_config_error() {
    let project = models("class Order(models.Model):\n    pass\n");
    let found = run(&project, json!({"checks": [{"id": "model-meta-attribute", "attrs": ["colour"]}]}));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, CheckId::X001);
    assert_eq!(found[0].level, Level::Critical);
}

#[test]
fn missing_required_key_yields_one_critical() {
    let project = models("class Order(models.Model):\n    pass\n");
    let found = run(&project, json!({"checks": [{"id": "model-attribute"}]}));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].level, Level::Critical);
    insta::assert_snapshot!(found[0].hint.as_deref().unwrap_or_default(), @r"
    Fix EXTRA_CHECKS in your settings. Errors:
    * checks
      * model-attribute
        * attrs
          * This field is required.
    ");
}

#[test]
fn help_text_needs_translation() {
    let project = models(
        "\
class Note(models.Model):
    plain = models.CharField(help_text=\"plain text\")
    translated = models.CharField(help_text=_(\"plain text\"))
",
    );
    let found = run(&project, json!({"checks": ["field-help-text-gettext"]}));
    assert_eq!(summary(&found), vec![("X053", "shop.Note.plain".to_owned())]);
}

// ── Levels ──

#[test]
fn document_level_fills_unset_levels() {
    let project = models("class Note(models.Model):\n    text = models.TextField(null=True)\n");
    let found = run(
        &project,
        json!({
            "level": "ERROR",
            "checks": ["field-verbose-name", {"id": "field-text-null", "level": "INFO"}],
        }),
    );
    let levels: Vec<(&str, Level)> = found.iter().map(|d| (d.code(), d.level)).collect();
    assert_eq!(levels, vec![("X050", Level::Error), ("X055", Level::Info)]);
}

#[test]
fn serializer_extra_kwargs_defaults_to_error() {
    let project = project(&[(
        "api/serializers.py",
        "\
from rest_framework import serializers


class UserSerializer(serializers.ModelSerializer):
    name = serializers.CharField()

    class Meta:
        extra_kwargs = {\"name\": {\"required\": False}}
",
    )]);
    let found = run(&project, json!({"checks": ["drf-model-serializer-extra-kwargs"]}));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].level, Level::Error);
    assert_eq!(found[0].location.as_ref().map(|l| l.line), Some(7));
}

// ── Disable comments ──

const TWO_FINDINGS: &[&str] = &["field-verbose-name", "field-text-null"];

fn with_comment(comment: &str) -> Vec<Diagnostic> {
    let project = models(&format!(
        "class Note(models.Model):\n    {comment}\n    text = models.CharField(null=True)\n"
    ));
    run(&project, json!({ "checks": TWO_FINDINGS }))
}

#[test]
fn bare_comment_disables_every_check() {
    assert_eq!(with_comment("# unrelated").len(), 2);
    assert!(with_comment("# extra-checks-disable-next-line").is_empty());
}

#[test]
fn comment_payload_is_monotonic() {
    let one = with_comment("# extra-checks-disable-next-line X050");
    assert_eq!(summary(&one), vec![("X055", "shop.Note.text".to_owned())]);
    let both = with_comment("# extra-checks-disable-next-line field-verbose-name, X055");
    assert!(both.is_empty());
}

#[test]
fn meta_comment_disables_meta_scoped_checks() {
    let project = models(
        "\
class Order(models.Model):
    # extra-checks-disable-next-line no-unique-together
    class Meta:
        unique_together = [(\"a\", \"b\")]


class Invoice(models.Model):
    class Meta:
        unique_together = [(\"a\", \"b\")]
",
    );
    let found = run(&project, json!({"checks": ["no-unique-together"]}));
    assert_eq!(summary(&found), vec![("X013", "shop.Invoice".to_owned())]);
    assert_eq!(found[0].location.as_ref().map(|l| l.line), Some(12));
}

#[test]
fn comment_above_class_disables_class_checks() {
    let project = models(
        "\
# extra-checks-disable-next-line model-admin
class Order(models.Model):
    pass


class Invoice(models.Model):
    pass
",
    );
    let found = run(&project, json!({"checks": ["model-admin"]}));
    assert_eq!(summary(&found), vec![("X012", "shop.Invoice".to_owned())]);
}

// ── Ignore registrations ──

#[test]
fn ignore_decorator_skips_the_class() {
    let project = models(
        "\
from extra_checks import ignore_checks


@ignore_checks(\"field-verbose-name\")
class Order(models.Model):
    code = models.CharField()


class Invoice(models.Model):
    code = models.CharField()
",
    );
    let found = run(&project, json!({"checks": ["field-verbose-name"]}));
    assert_eq!(summary(&found), vec![("X050", "shop.Invoice.code".to_owned())]);
}

#[test]
fn ignore_types_skip_field_classes() {
    let project = models("class Order(models.Model):\n    code = models.CharField()\n    total = models.IntegerField()\n");
    let found = run(
        &project,
        json!({"checks": [{"id": "field-verbose-name", "ignore_types": ["django.db.models.CharField"]}]}),
    );
    let objects: Vec<String> = summary(&found).into_iter().map(|(_, o)| o).collect();
    assert_eq!(objects, vec!["shop.Order.total"]);
}

#[test]
fn skip_predicate_is_consulted() {
    let project = models("class Order(models.Model):\n    code = models.CharField()\n");
    let settings = Settings::new(json!({"checks": ["field-verbose-name"]}))
        .skip_if(CheckId::X050, |target| target.object_key() == Some("shop.models.Order"));
    let controller = default_registry().bind(&settings, project.ignore_registry());
    assert_eq!(controller.run(Tag::Models, &project, None).count(), 0);
}

// ── Autofix ──

#[test]
fn choices_fix_applies_to_the_file() {
    let body = "\
class Order(models.Model):
    state = models.CharField(choices=[(\"new\", \"New\"), (\"paid\", \"Paid\")])
";
    let project = models(body);
    let found = run(&project, json!({"checks": ["field-choices-constraint"]}));
    assert_eq!(found.len(), 1);
    let fix = found[0].fix.as_ref().expect("fix for a locally declared field");
    assert!(found[0].fix_file().is_some_and(|p| p.ends_with("shop/models.py")));

    let text = format!("{MODELS_HEADER}{body}");
    let fixed = apply_replacements(&text, [fix]);
    assert!(fixed.contains(
        "\n    class Meta:\n        constraints = [models.CheckConstraint(name=\"%(app_label)s_%(class)s_state_valid\", check=models.Q(state__in=[\"new\", \"paid\"]))]"
    ));

    let refixed = Project::from_sources([("shop/models.py", fixed)], None).unwrap();
    assert!(run(&refixed, json!({"checks": ["field-choices-constraint"]})).is_empty());
}

// ── Groups ──

#[test]
fn groups_without_checks_are_not_bound() {
    let project = models("class Order(models.Model):\n    pass\n");
    let controller = default_registry().bind(
        &Settings::new(json!({"checks": ["model-admin"]})),
        project.ignore_registry(),
    );
    let tags: Vec<Tag> = controller.tags().collect();
    assert_eq!(tags, vec![Tag::SelfCheck, Tag::Models]);
}
