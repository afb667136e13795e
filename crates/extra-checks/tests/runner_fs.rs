//! Integration tests running the facade over projects on disk.

use extra_checks::{apply_replacements, ConfigFile, Level, Runner, Tag};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn shop() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shop/__init__.py", "");
    write(
        dir.path(),
        "shop/models.py",
        "\
from django.db import models


class Order(models.Model):
    state = models.CharField(choices=[(\"new\", \"New\"), (\"paid\", \"Paid\")])
    receipt = models.FileField()
",
    );
    write(
        dir.path(),
        "shop/admin.py",
        "\
from django.contrib import admin

from .models import Order

admin.site.register(Order)
",
    );
    write(
        dir.path(),
        "shop/migrations/0001_initial.py",
        "from django.db import models\n\n\nclass Stale(models.Model):\n    data = models.FileField()\n",
    );
    dir
}

fn load(dir: &TempDir, toml: &str) -> Runner {
    write(dir.path(), "extra-checks.toml", toml);
    let mut config = ConfigFile::from_file(&dir.path().join("extra-checks.toml")).unwrap();
    config.project.root = dir.path().to_path_buf();
    Runner::from_config(&config)
}

#[test]
fn config_file_drives_the_run() {
    let dir = shop();
    let runner = load(
        &dir,
        "checks = [\"field-file-upload-to\", \"model-admin\", \"field-choices-constraint\"]\n",
    );
    let (project, report) = runner.check().unwrap();

    assert!(report.healthy);
    let objects: Vec<String> = report
        .diagnostics
        .iter()
        .map(|d| format!("{} {}", d.code(), d.object.as_ref().map(ToString::to_string).unwrap_or_default()))
        .collect();
    assert_eq!(objects, vec!["X060 shop.Order.state", "X054 shop.Order.receipt"]);
    assert!(project.model("shop.models.Order").is_some());
    assert!(project.model("shop.migrations.0001_initial.Stale").is_none());
}

#[test]
fn fixes_rewrite_the_file_once() {
    let dir = shop();
    let runner = load(&dir, "checks = [\"field-choices-constraint\"]\n");
    let (_, report) = runner.check().unwrap();

    let fixes = report.fixes_by_file();
    assert_eq!(fixes.len(), 1);
    for (file, replacements) in fixes {
        let text = fs::read_to_string(file).unwrap();
        fs::write(file, apply_replacements(&text, replacements)).unwrap();
    }

    let (_, again) = runner.check().unwrap();
    assert!(again.diagnostics.is_empty());
}

#[test]
fn broken_document_reports_critical() {
    let dir = shop();
    let runner = load(&dir, "level = \"LOUD\"\nchecks = [\"field-file-upload-to\"]\n");
    let (_, report) = runner.tags([Tag::Models]).check().unwrap();

    assert!(!report.healthy);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(report.has_at_least(Level::Critical));
}

#[test]
fn pyproject_section_is_read() {
    let dir = shop();
    write(
        dir.path(),
        "pyproject.toml",
        "[tool.extra-checks]\nchecks = [\"field-file-upload-to\"]\n",
    );
    let mut config = ConfigFile::from_file(&dir.path().join("pyproject.toml")).unwrap();
    config.project.root = dir.path().to_path_buf();
    let (_, report) = Runner::from_config(&config).check().unwrap();
    assert_eq!(report.diagnostics.len(), 1);
}
