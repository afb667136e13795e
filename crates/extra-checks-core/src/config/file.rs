//! TOML configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Level;

/// File names searched for a project configuration, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["extra-checks.toml", ".extra-checks.toml"];

/// A loaded configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Project discovery settings.
    pub project: ProjectConfig,
    /// Exit threshold of the command line front end.
    pub fail_level: Option<Level>,
    /// The checks document (`include_apps`, `level`, `checks`), if any key
    /// of it was present.
    pub document: Option<serde_json::Value>,
}

impl ConfigFile {
    /// Loads configuration from a TOML file.
    ///
    /// A `pyproject.toml` is read from its `[tool.extra-checks]` table.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if path.file_name().is_some_and(|n| n == "pyproject.toml") {
            return Ok(Self::from_pyproject(&content)?.unwrap_or_default());
        }
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        Self::from_table(table)
    }

    /// Reads the `[tool.extra-checks]` table of a `pyproject.toml`.
    ///
    /// Returns `None` when the table is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_pyproject(content: &str) -> Result<Option<Self>, ConfigError> {
        let mut table: toml::Table = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        let section = table
            .remove("tool")
            .and_then(|tool| match tool {
                toml::Value::Table(mut tool) => tool.remove("extra-checks"),
                _ => None,
            });
        match section {
            Some(toml::Value::Table(section)) => Self::from_table(section).map(Some),
            Some(_) => Err(ConfigError::Parse {
                message: "[tool.extra-checks] must be a table".into(),
            }),
            None => Ok(None),
        }
    }

    fn from_table(mut table: toml::Table) -> Result<Self, ConfigError> {
        let project = match table.remove("project") {
            Some(value) => value.try_into().map_err(|e: toml::de::Error| ConfigError::Parse {
                message: format!("[project]: {e}"),
            })?,
            None => ProjectConfig::default(),
        };

        let fail_level = match table.remove("fail_level") {
            Some(toml::Value::String(s)) => Some(Level::parse(&s).ok_or_else(|| ConfigError::Parse {
                message: format!("fail_level: unknown level {s:?}"),
            })?),
            Some(other) => {
                return Err(ConfigError::Parse {
                    message: format!("fail_level: expected a string, found {other}"),
                })
            }
            None => None,
        };

        let document = if table.is_empty() {
            None
        } else {
            Some(serde_json::to_value(&table).map_err(|e| ConfigError::Parse {
                message: e.to_string(),
            })?)
        };

        Ok(Self {
            project,
            fail_level,
            document,
        })
    }
}

/// Where and how the Python project is discovered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project root (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns to exclude from discovery.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Explicit installed applications (dotted package names). When empty,
    /// every package holding `apps.py` or `models.py` is an application.
    #[serde(default)]
    pub installed_apps: Option<Vec<String>>,

    /// Extra directories treated as third-party install locations.
    #[serde(default)]
    pub site_prefixes: Vec<PathBuf>,

    /// Abort when a file fails to parse instead of indexing it anyway.
    #[serde(default)]
    pub fail_on_parse_error: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: default_exclude(),
            respect_gitignore: true,
            installed_apps: None,
            site_prefixes: Vec::new(),
            fail_on_parse_error: false,
        }
    }
}

impl ProjectConfig {
    /// Creates a configuration rooted at `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/migrations/**".to_string(),
        "**/node_modules/**".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_config() {
        let config = ConfigFile::default();
        assert!(config.project.respect_gitignore);
        assert!(config.document.is_none());
        assert!(config.fail_level.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
fail_level = "warning"
include_apps = ["blog"]
checks = [
    "field-verbose-name",
    { id = "model-attribute", attrs = ["site"] },
]

[project]
root = "./src"
exclude = ["**/generated/**"]
installed_apps = ["blog", "shop"]
"#;

        let config = ConfigFile::parse(toml).expect("Failed to parse");
        assert_eq!(config.project.root, PathBuf::from("./src"));
        assert_eq!(config.fail_level, Some(Level::Warning));
        assert_eq!(
            config.project.installed_apps,
            Some(vec!["blog".to_string(), "shop".to_string()])
        );
        assert_eq!(
            config.document,
            Some(json!({
                "include_apps": ["blog"],
                "checks": ["field-verbose-name", {"id": "model-attribute", "attrs": ["site"]}],
            }))
        );
    }

    #[test]
    fn pyproject_section() {
        let toml = r#"
[tool.black]
line-length = 88

[tool.extra-checks]
checks = ["field-null"]
"#;
        let config = ConfigFile::from_pyproject(toml).unwrap().unwrap();
        assert_eq!(config.document, Some(json!({"checks": ["field-null"]})));

        assert!(ConfigFile::from_pyproject("[tool.black]\nx = 1\n").unwrap().is_none());
    }

    #[test]
    fn bad_fail_level() {
        let err = ConfigFile::parse("fail_level = \"loud\"").unwrap_err();
        assert!(err.to_string().contains("fail_level"));
    }
}
