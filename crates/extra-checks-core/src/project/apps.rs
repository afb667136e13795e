//! Installed applications and third-party install locations.

use std::path::{Path, PathBuf};

/// An installed application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Dotted package name, e.g. `shop.orders`.
    pub name: String,
    /// Application label, the last segment of the name.
    pub label: String,
    /// Package directory.
    pub path: PathBuf,
}

impl AppConfig {
    /// Creates an application rooted at `path`.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let label = name.rsplit('.').next().unwrap_or(&name).to_owned();
        Self {
            name,
            label,
            path: path.into(),
        }
    }
}

/// Maps modules to their owning application by longest prefix.
#[derive(Debug, Clone, Default)]
pub struct AppResolver {
    apps: Vec<AppConfig>,
}

impl AppResolver {
    /// Creates a resolver. Longer names are matched first.
    #[must_use]
    pub fn new(mut apps: Vec<AppConfig>) -> Self {
        apps.sort_by(|a, b| b.name.len().cmp(&a.name.len()).then(a.name.cmp(&b.name)));
        apps.dedup_by(|a, b| a.name == b.name);
        Self { apps }
    }

    /// The application owning `module`.
    #[must_use]
    pub fn owning_app(&self, module: &str) -> Option<&AppConfig> {
        self.apps.iter().find(|app| {
            module == app.name
                || module
                    .strip_prefix(app.name.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Looks an application up by label.
    #[must_use]
    pub fn by_label(&self, label: &str) -> Option<&AppConfig> {
        self.apps.iter().find(|app| app.label == label)
    }

    /// Every application, sorted by name.
    #[must_use]
    pub fn apps(&self) -> Vec<&AppConfig> {
        let mut apps: Vec<&AppConfig> = self.apps.iter().collect();
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        apps
    }
}

/// Directories holding third-party code.
#[derive(Debug, Clone, Default)]
pub struct SitePrefixes {
    prefixes: Vec<PathBuf>,
}

impl SitePrefixes {
    /// Creates the set from explicitly configured prefixes.
    #[must_use]
    pub fn new(prefixes: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            prefixes: prefixes.into_iter().collect(),
        }
    }

    /// Adds a prefix, e.g. a virtualenv root.
    pub fn add(&mut self, prefix: PathBuf) {
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
    }

    /// Whether `path` lies in a third-party location.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        let in_site_dir = path.components().any(|c| {
            matches!(
                c.as_os_str().to_str(),
                Some("site-packages" | "dist-packages")
            )
        });
        in_site_dir || self.prefixes.iter().any(|p| path.starts_with(p))
    }
}
