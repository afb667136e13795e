//! Python module naming.

use std::path::{Component, Path};

/// Dotted module name of a file relative to the project root.
///
/// `pkg/__init__.py` maps to `pkg`. Returns `None` for non-Python files
/// and path components that are not valid identifiers.
#[must_use]
pub fn module_name(relative_path: &Path) -> Option<String> {
    if relative_path.extension().and_then(|e| e.to_str()) != Some("py") {
        return None;
    }
    let mut parts: Vec<String> = relative_path
        .with_extension("")
        .components()
        .filter_map(|c| {
            if let Component::Normal(s) = c {
                s.to_str().map(String::from)
            } else {
                None
            }
        })
        .collect();

    if parts.last().is_some_and(|last| last == "__init__") {
        parts.pop();
    }
    if parts.is_empty() || !parts.iter().all(|p| is_identifier(p)) {
        return None;
    }
    Some(parts.join("."))
}

/// Whether `path` is a package `__init__.py`.
#[must_use]
pub fn is_package_file(path: &Path) -> bool {
    path.file_stem().is_some_and(|s| s == "__init__")
}

/// Absolute target of a relative import.
///
/// `level` counts the leading dots; `target` may be empty (`from . import x`).
#[must_use]
pub fn resolve_relative(module: &str, is_package: bool, level: usize, target: &str) -> String {
    if level == 0 {
        return target.to_owned();
    }
    let mut parts: Vec<&str> = module.split('.').collect();
    if !is_package {
        parts.pop();
    }
    for _ in 1..level {
        parts.pop();
    }
    if !target.is_empty() {
        parts.push(target);
    }
    parts.join(".")
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_names() {
        assert_eq!(
            module_name(Path::new("blog/models.py")).as_deref(),
            Some("blog.models")
        );
        assert_eq!(
            module_name(Path::new("blog/__init__.py")).as_deref(),
            Some("blog")
        );
        assert_eq!(module_name(Path::new("blog/readme.md")), None);
        assert_eq!(module_name(Path::new("my-site/app.py")), None);
    }

    #[test]
    fn relative_imports() {
        assert_eq!(resolve_relative("blog.admin", false, 1, "models"), "blog.models");
        assert_eq!(resolve_relative("blog", true, 1, "models"), "blog.models");
        assert_eq!(resolve_relative("blog.api.views", false, 2, ""), "blog");
        assert_eq!(resolve_relative("blog.api", false, 0, "x.y"), "x.y");
    }
}
