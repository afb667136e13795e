//! Static index of a Django project.
//!
//! The checks need what a running Django process knows about its models
//! and serializers. [`Project`] recovers it from the source tree:
//!
//! - applications, from `installed_apps` or from packages that hold
//!   `apps.py` / `models.py`
//! - models with their `Meta` options and fields
//! - serializers, split into plain and model-bound ones
//! - admin registrations and `@ignore_checks(...)` decorators

pub mod apps;
pub mod django;
pub mod models;
pub mod modules;
pub mod resolve;
pub mod serializers;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use extra_checks_syntax::{Call, Expr, Module};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ProjectConfig;
use crate::ignore::IgnoreRegistry;
use crate::source::{ClassLocation, FsSourceProvider, MemorySourceProvider, SourceProvider};

pub use apps::{AppConfig, AppResolver, SitePrefixes};
pub use models::{ChoiceValue, CheckConstraint, Field, FieldDefault, ModelClass, ModelMeta};
pub use resolve::{ClassIndex, ClassInfo, SourceFile};
pub use serializers::SerializerClass;

use models::ModelBuilder;
use serializers::SerializerBuilder;

/// Framework packages whose classes are known without reading them.
const FRAMEWORK_PACKAGES: &[&str] = &["django", "rest_framework"];

/// Base of application configs.
const APP_CONFIG: &str = "django.apps.AppConfig";

/// Errors that can occur while indexing a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// IO error reading a source file.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A source file has syntax errors.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Directory walking failed.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
}

/// The indexed project.
pub struct Project {
    provider: Box<dyn SourceProvider>,
    index: ClassIndex,
    apps: AppResolver,
    site: SitePrefixes,
    models: Vec<ModelClass>,
    serializers: Vec<SerializerClass>,
    admin: BTreeSet<String>,
    ignore: IgnoreRegistry,
    file_count: usize,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("files", &self.file_count)
            .field("apps", &self.apps)
            .field("models", &self.models.len())
            .field("serializers", &self.serializers.len())
            .finish_non_exhaustive()
    }
}

impl Project {
    /// Walks `config.root` and indexes every Python file.
    ///
    /// # Errors
    ///
    /// Returns an error if walking or reading fails, or on a syntax error
    /// when `fail_on_parse_error` is set.
    pub fn load(config: &ProjectConfig) -> Result<Self, ProjectError> {
        let root = config.root.as_path();
        info!("Indexing project at {}", root.display());

        let mut builder = ignore::WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(config.respect_gitignore)
            .git_exclude(config.respect_gitignore);

        let mut site = SitePrefixes::new(config.site_prefixes.iter().map(|p| root.join(p)));
        let mut paths = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.file_name().is_some_and(|n| n == "pyvenv.cfg") {
                if let Some(venv) = path.parent() {
                    debug!("Virtual environment at {}", venv.display());
                    site.add(venv.to_path_buf());
                }
                continue;
            }
            if path.extension().is_some_and(|e| e == "py") {
                let relative = path.strip_prefix(root).unwrap_or(path);
                if should_exclude(relative, &config.exclude) {
                    debug!("Excluding: {}", path.display());
                    continue;
                }
                paths.push(path.to_path_buf());
            }
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let content = std::fs::read_to_string(&path).map_err(|source| ProjectError::Io {
                path: path.clone(),
                source,
            })?;
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            if let Some(file) = parse_file(path, &relative, &content, &site, config.fail_on_parse_error)? {
                files.push(file);
            }
        }

        Ok(Self::build(
            files,
            Box::new(FsSourceProvider),
            site,
            config.installed_apps.as_deref(),
        ))
    }

    /// Indexes in-memory sources, keyed by root-relative path.
    ///
    /// # Errors
    ///
    /// Returns an error when the grammar cannot be loaded.
    pub fn from_sources<I, P, C>(sources: I, installed_apps: Option<&[String]>) -> Result<Self, ProjectError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<PathBuf>,
        C: Into<String>,
    {
        let provider: MemorySourceProvider = sources.into_iter().collect();
        let site = SitePrefixes::default();
        let mut files = Vec::new();
        let mut paths: Vec<PathBuf> = provider.paths().map(Path::to_path_buf).collect();
        paths.sort();
        for path in paths {
            let content = provider.read(&path).unwrap_or_default();
            if let Some(file) = parse_file(path.clone(), &path, &content, &site, false)? {
                files.push(file);
            }
        }
        Ok(Self::build(files, Box::new(provider), site, installed_apps))
    }

    fn build(
        files: Vec<SourceFile>,
        provider: Box<dyn SourceProvider>,
        site: SitePrefixes,
        installed_apps: Option<&[String]>,
    ) -> Self {
        let index = ClassIndex::build(&files);
        let apps = AppResolver::new(discover_apps(&files, &index, installed_apps));

        let model_builder = ModelBuilder::new(&index);
        let mut models = Vec::new();
        for info in model_builder.model_classes() {
            let meta = model_builder.meta(info, 0);
            let app = match (apps.owning_app(&info.module), &meta.app_label) {
                (_, Some(label)) => apps.by_label(label).or_else(|| apps.owning_app(&info.module)),
                (Some(app), None) => Some(app),
                (None, None) => None,
            };
            let Some(app) = app else {
                debug!("Model {} belongs to no application, skipping", info.path);
                continue;
            };
            let label = meta.app_label.clone().unwrap_or_else(|| app.label.clone());
            models.push(model_builder.build(info, label, app.name.clone()));
        }

        let serializer_builder = SerializerBuilder::new(&index);
        let (plain, bound) = serializer_builder.partition();
        let serializers = plain
            .into_iter()
            .chain(bound)
            .map(|info| serializer_builder.build(info))
            .collect();

        let mut admin = BTreeSet::new();
        let mut ignore = IgnoreRegistry::new();
        for file in &files {
            collect_registrations(&index, file, &mut admin, &mut ignore);
        }

        let project = Self {
            provider,
            apps,
            site,
            models,
            serializers,
            admin,
            ignore,
            file_count: files.len(),
            index,
        };
        info!(
            files = project.file_count,
            apps = project.apps.apps().len(),
            models = project.models.len(),
            serializers = project.serializers.len(),
            "Project indexed"
        );
        project
    }

    /// Source access for class views.
    #[must_use]
    pub fn provider(&self) -> &dyn SourceProvider {
        self.provider.as_ref()
    }

    /// The class graph.
    #[must_use]
    pub fn index(&self) -> &ClassIndex {
        &self.index
    }

    /// Applications.
    #[must_use]
    pub fn apps(&self) -> &AppResolver {
        &self.apps
    }

    /// Number of indexed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Every model, abstract ones included.
    #[must_use]
    pub fn models(&self) -> &[ModelClass] {
        &self.models
    }

    /// A model by class path.
    #[must_use]
    pub fn model(&self, path: &str) -> Option<&ModelClass> {
        self.models.iter().find(|m| m.path == path)
    }

    /// Location of any project class.
    #[must_use]
    pub fn class_location(&self, path: &str) -> Option<ClassLocation> {
        self.index.class(path).and_then(ClassInfo::location)
    }

    /// Ignore registrations found in decorators.
    #[must_use]
    pub fn ignore_registry(&self) -> &IgnoreRegistry {
        &self.ignore
    }

    /// Whether a model is registered with an admin site.
    #[must_use]
    pub fn is_registered_in_admin(&self, model: &ModelClass) -> bool {
        self.admin.contains(&model.path)
    }

    /// Concrete models to check.
    ///
    /// `apps` restricts the run to applications by name or label. With
    /// `include_apps` only those applications are checked; without it
    /// applications living in third-party locations are skipped.
    pub fn models_to_check<'a>(
        &'a self,
        apps: Option<&'a [String]>,
        include_apps: Option<&'a [String]>,
    ) -> impl Iterator<Item = &'a ModelClass> + 'a {
        let selected: BTreeSet<&str> = self
            .apps
            .apps()
            .into_iter()
            .filter(|app| {
                apps.map_or(true, |names| {
                    names.iter().any(|n| *n == app.name || *n == app.label)
                })
            })
            .filter(|app| match include_apps {
                Some(include) => include.contains(&app.name),
                None => !self.site.contains(&app.path),
            })
            .map(|app| app.name.as_str())
            .collect();
        self.models
            .iter()
            .filter(move |m| !m.meta.is_abstract && selected.contains(m.app.as_str()))
    }

    /// Plain and model-bound serializers to check.
    ///
    /// With `include_apps` only serializers declared inside those
    /// applications are kept; otherwise third-party ones are dropped.
    #[must_use]
    pub fn serializers_to_check(
        &self,
        include_apps: Option<&[String]>,
    ) -> (Vec<&SerializerClass>, Vec<&SerializerClass>) {
        let keep = |s: &SerializerClass| match include_apps {
            Some(include) => self
                .apps
                .apps()
                .iter()
                .filter(|app| include.contains(&app.name))
                .any(|app| s.file.starts_with(&app.path)),
            None => !self.site.contains(&s.file),
        };
        self.serializers
            .iter()
            .filter(|s| keep(s))
            .partition(|s| !s.model_bound)
    }
}

fn should_exclude(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();
    patterns.iter().any(|pattern| {
        if glob::Pattern::new(pattern).is_ok_and(|p| p.matches(&path_str)) {
            return true;
        }
        // Also check as substring for patterns like "**/migrations/**"
        let normalized = pattern.replace("**", "");
        !normalized.is_empty() && path_str.contains(&normalized)
    })
}

/// Module path of a file: relative to the `site-packages` directory for
/// third-party code, otherwise relative to the root.
fn module_path<'p>(relative: &'p Path) -> &'p Path {
    let mut ancestors = relative.ancestors();
    ancestors
        .find(|a| {
            a.file_name()
                .is_some_and(|n| n == "site-packages" || n == "dist-packages")
        })
        .and_then(|site_dir| relative.strip_prefix(site_dir).ok())
        .unwrap_or(relative)
}

fn parse_file(
    path: PathBuf,
    relative: &Path,
    content: &str,
    site: &SitePrefixes,
    fail_on_parse_error: bool,
) -> Result<Option<SourceFile>, ProjectError> {
    let is_site = site.contains(&path);
    let module_rel = module_path(relative);
    let Some(module) = modules::module_name(module_rel) else {
        debug!("Not a module path: {}", relative.display());
        return Ok(None);
    };
    if is_site && FRAMEWORK_PACKAGES.contains(&module.split('.').next().unwrap_or_default()) {
        return Ok(None);
    }
    let ast = extra_checks_syntax::parse(content).map_err(|e| ProjectError::Parse {
        path: path.clone(),
        message: e.to_string(),
    })?;
    if ast.has_errors {
        warn!("Syntax errors in {}", path.display());
        if fail_on_parse_error {
            return Err(ProjectError::Parse {
                path,
                message: "syntax error".to_owned(),
            });
        }
    }
    Ok(Some(SourceFile {
        is_package: modules::is_package_file(module_rel),
        path,
        module,
        is_site,
        ast,
    }))
}

/// Package directory of `module`, given one of its files.
fn package_dir(file: &SourceFile, app: &str) -> PathBuf {
    let depth = file.module.split('.').count() - app.split('.').count();
    let mut dir = file.path.parent().map(Path::to_path_buf).unwrap_or_default();
    for _ in 0..(depth + usize::from(file.is_package)).saturating_sub(1) {
        dir = dir.parent().map(Path::to_path_buf).unwrap_or_default();
    }
    dir
}

fn discover_apps(files: &[SourceFile], index: &ClassIndex, installed: Option<&[String]>) -> Vec<AppConfig> {
    let mut apps: Vec<AppConfig> = Vec::new();
    let mut push = |name: &str, file: &SourceFile| {
        if !apps.iter().any(|a| a.name == name) {
            apps.push(AppConfig::new(name, package_dir(file, name)));
        }
    };

    match installed {
        Some(names) => {
            for name in names {
                let prefix = format!("{name}.");
                if let Some(file) = files
                    .iter()
                    .find(|f| f.module == *name || f.module.starts_with(&prefix))
                {
                    push(name, file);
                } else {
                    debug!("Installed app {name} has no sources");
                }
            }
        }
        None => {
            for file in files {
                let segments: Vec<&str> = file.module.split('.').collect();
                let marker = segments
                    .iter()
                    .rposition(|s| *s == "models" || *s == "apps")
                    .filter(|&i| i > 0 && (segments[i] == "models" || i == segments.len() - 1));
                if let Some(i) = marker {
                    push(&segments[..i].join("."), file);
                }
            }
        }
    }

    // `label = "..."` on an AppConfig subclass overrides the default label.
    for class in index.collect_subclasses(&[APP_CONFIG]) {
        let name = class
            .def
            .assignment("name")
            .and_then(|a| a.value.as_ref())
            .and_then(Expr::as_str);
        let label = class
            .def
            .assignment("label")
            .and_then(|a| a.value.as_ref())
            .and_then(Expr::as_str);
        if let (Some(name), Some(label)) = (name, label) {
            if let Some(app) = apps.iter_mut().find(|a| a.name == name) {
                app.label = label.to_owned();
            }
        }
    }
    apps
}

/// Class paths named by the arguments of a registration call.
fn class_args<'c>(index: &'c ClassIndex, module: &'c str, call: &'c Call) -> impl Iterator<Item = String> + 'c {
    call.args
        .iter()
        .flat_map(|arg| match arg.elements() {
            Some(items) => items.iter().collect::<Vec<_>>(),
            None => vec![arg],
        })
        .filter_map(Expr::dotted)
        .map(move |name| index.resolve(module, name))
}

fn collect_registrations(
    index: &ClassIndex,
    file: &SourceFile,
    admin: &mut BTreeSet<String>,
    ignore: &mut IgnoreRegistry,
) {
    let Module { calls, classes, .. } = &file.ast;

    // admin.site.register(Model, ...) and custom sites.
    for call in calls {
        if call.func.last_segment() == Some("register") {
            admin.extend(class_args(index, &file.module, call));
        }
    }

    for class in classes {
        let path = format!("{}.{}", file.module, class.name);
        for decorator in class.decorators.iter().filter_map(Expr::as_call) {
            match decorator.func.last_segment() {
                Some("register") => admin.extend(class_args(index, &file.module, decorator)),
                Some("ignore_checks") => {
                    let ids: Vec<String> = decorator
                        .args
                        .iter()
                        .filter_map(|arg| arg.as_str().or_else(|| arg.last_segment()))
                        .map(String::from)
                        .collect();
                    debug!(class = %path, ?ids, "Ignore registration");
                    ignore.register(path.clone(), ids);
                }
                _ => {}
            }
        }
    }
}
