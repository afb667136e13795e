//! Locating and loading the configuration.
//!
//! Candidates are tried in order and the first one found is loaded:
//!
//! 1. the file given with `--config`
//! 2. `extra-checks.toml`, then `.extra-checks.toml`, in the project directory
//! 3. the `[tool.extra-checks]` table of the project's `pyproject.toml`
//! 4. `config.toml` in the user directory (`$EXTRA_CHECKS_CONFIG_DIR`,
//!    else `~/.extra-checks`)
//!
//! Without any of them the built-in defaults apply, which enable no checks.

use anyhow::{Context, Result};
use extra_checks::config::CONFIG_FILE_NAMES;
use extra_checks::ConfigFile;
use std::fmt;
use std::path::{Path, PathBuf};

const PYPROJECT: &str = "pyproject.toml";
const USER_CONFIG: &str = "config.toml";

/// Which candidate the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// `--config` on the command line.
    Flag(PathBuf),
    /// A dedicated file in the project directory.
    ProjectFile(PathBuf),
    /// The `[tool.extra-checks]` table of `pyproject.toml`.
    Pyproject(PathBuf),
    /// The per-user configuration.
    User(PathBuf),
    /// Nothing found.
    Builtin,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(p) | Self::ProjectFile(p) => write!(f, "{}", p.display()),
            Self::Pyproject(p) => write!(f, "[tool.extra-checks] in {}", p.display()),
            Self::User(p) => write!(f, "user config {}", p.display()),
            Self::Builtin => f.write_str("built-in defaults"),
        }
    }
}

/// A loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The candidate that was used.
    pub origin: Origin,
    /// The configuration, with `[project] root` anchored to the project
    /// directory.
    pub config: ConfigFile,
}

/// Finds and loads the configuration of one project directory.
#[derive(Debug, Clone)]
pub struct Resolver {
    project_dir: PathBuf,
    user_dir: Option<PathBuf>,
}

impl Resolver {
    /// Creates a resolver for `project_dir` using the per-user directory
    /// of the environment.
    #[must_use]
    pub fn new(project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            user_dir: default_user_dir(),
        }
    }

    /// Replaces the per-user directory; `None` disables that candidate.
    #[must_use]
    pub fn with_user_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_dir = dir;
        self
    }

    /// Loads the first candidate found, or the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the chosen file cannot be read or parsed, or
    /// when `flag` names a file that does not exist.
    pub fn resolve(&self, flag: Option<&Path>) -> Result<Resolved> {
        let (origin, mut config) = self.load(flag)?;
        if config.project.root.is_relative() {
            config.project.root = self.project_dir.join(&config.project.root);
        }
        tracing::debug!("Configuration from {origin}");
        Ok(Resolved { origin, config })
    }

    fn load(&self, flag: Option<&Path>) -> Result<(Origin, ConfigFile)> {
        if let Some(path) = flag {
            return Ok((Origin::Flag(path.to_path_buf()), read(path)?));
        }

        for name in CONFIG_FILE_NAMES {
            let path = self.project_dir.join(name);
            if path.is_file() {
                let config = read(&path)?;
                return Ok((Origin::ProjectFile(path), config));
            }
        }

        let pyproject = self.project_dir.join(PYPROJECT);
        if pyproject.is_file() {
            let content = std::fs::read_to_string(&pyproject)
                .with_context(|| format!("Failed to read {}", pyproject.display()))?;
            let table = ConfigFile::from_pyproject(&content)
                .with_context(|| format!("Failed to load config from {}", pyproject.display()))?;
            if let Some(config) = table {
                return Ok((Origin::Pyproject(pyproject), config));
            }
        }

        if let Some(path) = self.user_dir.as_ref().map(|d| d.join(USER_CONFIG)) {
            if path.is_file() {
                let config = read(&path)?;
                return Ok((Origin::User(path), config));
            }
        }

        Ok((Origin::Builtin, ConfigFile::default()))
    }
}

/// Resolves the configuration of `project_dir`.
///
/// # Errors
///
/// See [`Resolver::resolve`].
pub fn resolve(project_dir: &Path, flag: Option<&Path>) -> Result<Resolved> {
    Resolver::new(project_dir).resolve(flag)
}

fn read(path: &Path) -> Result<ConfigFile> {
    ConfigFile::from_file(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

fn default_user_dir() -> Option<PathBuf> {
    match std::env::var_os("EXTRA_CHECKS_CONFIG_DIR") {
        Some(dir) => Some(PathBuf::from(dir)),
        None => home::home_dir().map(|h| h.join(".extra-checks")),
    }
}
