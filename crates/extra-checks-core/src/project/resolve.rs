//! Class graph: name resolution, ancestry and subclass collection.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use extra_checks_syntax::{Assign, ClassDef, Expr, Module, Stmt};

use super::django;
use super::modules::resolve_relative;
use crate::source::ClassLocation;

const MAX_REEXPORT_DEPTH: usize = 8;

/// One parsed project file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path handed to the source provider.
    pub path: PathBuf,
    /// Dotted module name.
    pub module: String,
    /// Whether the file is a package `__init__.py`.
    pub is_package: bool,
    /// Whether the file lives in a third-party location.
    pub is_site: bool,
    /// Parsed content.
    pub ast: Module,
}

/// A class declared in the project.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Dotted path, e.g. `blog.models.Post`.
    pub path: String,
    /// Declaring module.
    pub module: String,
    /// Declaring file.
    pub file: PathBuf,
    /// Declaration. Built from the `type()` call for dynamic classes.
    pub def: ClassDef,
    /// Whether the class was created with `type(...)`.
    pub dynamic: bool,
    /// Resolved base paths.
    pub bases: Vec<String>,
}

impl ClassInfo {
    /// Class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Source location; `None` for dynamic classes.
    #[must_use]
    pub fn location(&self) -> Option<ClassLocation> {
        (!self.dynamic).then(|| ClassLocation {
            path: self.file.clone(),
            line: self.def.line,
            end_line: self.def.end_line,
        })
    }
}

#[derive(Debug, Default)]
struct ModuleScope {
    imports: HashMap<String, String>,
    classes: HashSet<String>,
    assignments: HashMap<String, Expr>,
}

/// Index of every class and module scope in the project.
#[derive(Debug, Default)]
pub struct ClassIndex {
    scopes: HashMap<String, ModuleScope>,
    classes: Vec<ClassInfo>,
    by_path: HashMap<String, usize>,
    ancestry: HashMap<String, Vec<String>>,
}

impl ClassIndex {
    /// Builds the index from parsed files.
    #[must_use]
    pub fn build(files: &[SourceFile]) -> Self {
        let mut index = Self::default();

        for file in files {
            let scope = index.scopes.entry(file.module.clone()).or_default();
            for import in &file.ast.imports {
                let target = resolve_relative(&file.module, file.is_package, import.level, &import.target);
                scope.imports.insert(import.local.clone(), target);
            }
            for class in &file.ast.classes {
                scope.classes.insert(class.name.clone());
            }
            for assign in &file.ast.assignments {
                if let Some(value) = &assign.value {
                    for target in &assign.targets {
                        scope.assignments.insert(target.clone(), value.clone());
                        if dynamic_class(target, value).is_some() {
                            scope.classes.insert(target.clone());
                        }
                    }
                }
            }
        }

        for file in files {
            for class in &file.ast.classes {
                index.push_class(file, class.clone(), false);
            }
            for assign in &file.ast.assignments {
                let Some(value) = &assign.value else { continue };
                for target in &assign.targets {
                    if let Some(def) = dynamic_class(target, value) {
                        index.push_class(file, def, true);
                    }
                }
            }
        }

        let paths: Vec<String> = index.classes.iter().map(|c| c.path.clone()).collect();
        for path in paths {
            let chain = index.compute_ancestry(&path);
            index.ancestry.insert(path, chain);
        }
        index
    }

    fn push_class(&mut self, file: &SourceFile, def: ClassDef, dynamic: bool) {
        let path = format!("{}.{}", file.module, def.name);
        let bases = def
            .bases
            .iter()
            .filter_map(Expr::dotted)
            .map(|b| self.resolve(&file.module, b))
            .collect();
        let info = ClassInfo {
            path: path.clone(),
            module: file.module.clone(),
            file: file.path.clone(),
            def,
            dynamic,
            bases,
        };
        // A redefinition shadows the earlier class.
        if let Some(&i) = self.by_path.get(&path) {
            self.classes[i] = info;
        } else {
            self.by_path.insert(path, self.classes.len());
            self.classes.push(info);
        }
    }

    /// Resolves a dotted name used in `module` to a canonical class path.
    #[must_use]
    pub fn resolve(&self, module: &str, dotted: &str) -> String {
        let (head, rest) = dotted.split_once('.').map_or((dotted, None), |(h, r)| (h, Some(r)));
        let base = match self.scopes.get(module) {
            Some(scope) => {
                if let Some(target) = scope.imports.get(head) {
                    target.clone()
                } else if scope.classes.contains(head) {
                    format!("{module}.{head}")
                } else {
                    head.to_owned()
                }
            }
            None => head.to_owned(),
        };
        let full = match rest {
            Some(rest) => format!("{base}.{rest}"),
            None => base,
        };
        self.follow_reexports(&full, 0)
    }

    fn follow_reexports(&self, path: &str, depth: usize) -> String {
        if depth >= MAX_REEXPORT_DEPTH || self.by_path.contains_key(path) {
            return django::canonical(path);
        }
        if let Some((module, name)) = path.rsplit_once('.') {
            if let Some(target) = self.scopes.get(module).and_then(|s| s.imports.get(name)) {
                if target != path {
                    return self.follow_reexports(target, depth + 1);
                }
            }
        }
        django::canonical(path)
    }

    /// Finds the module-level assignment behind `dotted` as seen from `module`.
    #[must_use]
    pub fn constant(&self, module: &str, dotted: &str) -> Option<&Expr> {
        if !dotted.contains('.') {
            if let Some(value) = self.scopes.get(module).and_then(|s| s.assignments.get(dotted)) {
                return Some(value);
            }
        }
        let path = self.resolve(module, dotted);
        let (owner, name) = path.rsplit_once('.')?;
        self.scopes.get(owner)?.assignments.get(name)
    }

    fn compute_ancestry(&self, path: &str) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::from([path.to_owned()]);
        let mut result = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::from([path.to_owned()]);
        while let Some(current) = queue.pop_front() {
            let parents = match self.class(&current) {
                Some(info) => info.bases.clone(),
                None => django::ancestors(&current).into_iter().take(1).collect(),
            };
            for parent in parents {
                if seen.insert(parent.clone()) {
                    result.push(parent.clone());
                    queue.push_back(parent);
                }
            }
        }
        result
    }

    /// A project class by path.
    #[must_use]
    pub fn class(&self, path: &str) -> Option<&ClassInfo> {
        self.by_path.get(path).map(|&i| &self.classes[i])
    }

    /// Every project class, in discovery order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.iter()
    }

    /// Ancestors of a class, nearest first. Works for framework classes too.
    #[must_use]
    pub fn ancestors(&self, path: &str) -> Vec<String> {
        self.ancestry
            .get(path)
            .cloned()
            .unwrap_or_else(|| self.compute_ancestry(path))
    }

    /// Whether `path` is `base` or inherits from it.
    #[must_use]
    pub fn is_subclass(&self, path: &str, base: &str) -> bool {
        path == base || self.ancestors(path).iter().any(|a| a == base)
    }

    /// Project classes inheriting from any of `bases`, without duplicates.
    #[must_use]
    pub fn collect_subclasses(&self, bases: &[&str]) -> Vec<&ClassInfo> {
        let mut seen = HashSet::new();
        self.classes
            .iter()
            .filter(|c| {
                !bases.contains(&c.path.as_str())
                    && bases.iter().any(|b| self.is_subclass(&c.path, b))
            })
            .filter(|c| seen.insert(c.path.as_str()))
            .collect()
    }
}

/// Turns `Name = type("Name", (Base,), {...})` into a class declaration.
fn dynamic_class(target: &str, value: &Expr) -> Option<ClassDef> {
    let call = value.as_call()?;
    if call.func_name() != Some("type") || call.args.len() != 3 {
        return None;
    }
    let name = call.args[0].as_str()?;
    if name != target {
        return None;
    }
    let bases = call.args[1].elements()?.to_vec();
    let Expr::Dict(items) = &call.args[2] else {
        return None;
    };
    let body = items
        .iter()
        .filter_map(|(key, value)| {
            Some(Stmt::Assign(Assign {
                targets: vec![key.as_str()?.to_owned()],
                value: Some(value.clone()),
                line: 0,
                end_line: 0,
                value_start: extra_checks_syntax::Position::default(),
                element_spans: Vec::new(),
            }))
        })
        .collect();
    Some(ClassDef {
        name: name.to_owned(),
        bases,
        keywords: Vec::new(),
        decorators: Vec::new(),
        line: 0,
        class_line: 0,
        end_line: 0,
        column: 0,
        body_column: 0,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, module: &str, source: &str) -> SourceFile {
        SourceFile {
            path: path.into(),
            module: module.into(),
            is_package: path.ends_with("__init__.py"),
            is_site: false,
            ast: extra_checks_syntax::parse(source).unwrap(),
        }
    }

    fn index() -> ClassIndex {
        ClassIndex::build(&[
            file(
                "core/models.py",
                "core.models",
                "from django.db import models\n\nclass Base(models.Model):\n    pass\n",
            ),
            file("core/__init__.py", "core", "from .models import Base\n"),
            file(
                "blog/models.py",
                "blog.models",
                "from core import Base\nfrom django.db.models import fields\n\n\
class Post(Base):\n    title = fields.CharField()\n\nclass Draft(Post):\n    pass\n\n\
Dyn = type(\"Dyn\", (Base,), {\"__module__\": \"blog.models\"})\n",
            ),
        ])
    }

    #[test]
    fn resolves_through_reexports() {
        let index = index();
        assert_eq!(index.resolve("blog.models", "Base"), "core.models.Base");
        assert_eq!(
            index.resolve("blog.models", "fields.CharField"),
            "django.db.models.CharField"
        );
        assert_eq!(index.resolve("blog.models", "Post"), "blog.models.Post");
    }

    #[test]
    fn ancestry_reaches_framework_roots() {
        let index = index();
        assert_eq!(
            index.ancestors("blog.models.Draft"),
            vec!["blog.models.Post", "core.models.Base", django::MODEL]
        );
        assert!(index.is_subclass("blog.models.Dyn", django::MODEL));
        assert!(index.class("blog.models.Dyn").unwrap().dynamic);
    }

    #[test]
    fn subclasses_are_collected_once() {
        let index = index();
        let found: Vec<&str> = index
            .collect_subclasses(&["core.models.Base", "blog.models.Post"])
            .iter()
            .map(|c| c.path.as_str())
            .collect();
        assert_eq!(found, vec!["blog.models.Post", "blog.models.Draft", "blog.models.Dyn"]);
    }

    #[test]
    fn constants_resolve_across_modules() {
        let index = ClassIndex::build(&[
            file("a.py", "a", "CHOICES = [(1, 'one')]\n"),
            file("b.py", "b", "from a import CHOICES\n"),
        ]);
        assert!(matches!(index.constant("b", "CHOICES"), Some(Expr::List(_))));
        assert!(index.constant("b", "MISSING").is_none());
    }
}
