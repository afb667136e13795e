//! Python front end using Tree-sitter.

use thiserror::Error;
use tree_sitter::{Language, Node, Parser};

use crate::ir::{Assign, Call, ClassDef, Expr, Import, Keyword, Module, Position, Span, Stmt};

/// Errors raised while parsing Python source.
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// The grammar could not be loaded into the parser.
    #[error("failed to load python grammar: {0}")]
    Language(String),

    /// Tree-sitter returned no tree.
    #[error("python parser produced no tree")]
    NoTree,
}

/// Parses Python source into the [`Module`] IR.
pub struct PythonParser {
    language: Language,
}

impl PythonParser {
    /// Creates a new parser for the bundled Python grammar.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Parses `source`.
    ///
    /// Tree-sitter recovers from syntax errors, so a tree with error nodes
    /// still yields a module; [`Module::has_errors`] reports it.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar cannot be loaded or no tree is built.
    pub fn parse(&self, source: &str) -> Result<Module, SyntaxError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| SyntaxError::Language(e.to_string()))?;

        let src = source.as_bytes();
        let tree = parser.parse(src, None).ok_or(SyntaxError::NoTree)?;
        let root = tree.root_node();

        let mut module = Module {
            has_errors: root.has_error(),
            ..Module::default()
        };
        collect_block(&root, src, &mut module);
        Ok(module)
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.start_byte()..node.end_byte()]).unwrap_or("")
}

fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

fn start_line(node: &Node<'_>) -> usize {
    node.start_position().row + 1
}

/// A node ending in a newline reports the following row; clamp it back.
fn end_line(node: &Node<'_>) -> usize {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row
    } else {
        end.row + 1
    }
}

fn position(node: &Node<'_>) -> Position {
    Position {
        line: node.start_position().row + 1,
        column: node.start_position().column,
    }
}

fn span(node: &Node<'_>) -> Span {
    let end = node.end_position();
    Span {
        start: position(node),
        end: Position {
            line: end.row + 1,
            column: end.column,
        },
    }
}

fn element_spans(node: Option<Node<'_>>) -> Vec<Span> {
    match node {
        Some(n) if matches!(n.kind(), "list" | "tuple") => named_children(&n).iter().map(span).collect(),
        _ => Vec::new(),
    }
}

/// Walks module-level statements, descending into compound statements
/// (`if`, `try`, `with`) but never into functions.
fn collect_block(node: &Node<'_>, src: &[u8], module: &mut Module) {
    for child in named_children(node) {
        match child.kind() {
            "class_definition" => module.classes.push(class_def(&child, None, src)),
            "decorated_definition" => {
                if let Some(def) = child.child_by_field_name("definition") {
                    if def.kind() == "class_definition" {
                        module.classes.push(class_def(&def, Some(&child), src));
                    }
                }
            }
            "expression_statement" => {
                for inner in named_children(&child) {
                    match inner.kind() {
                        "assignment" => {
                            if let Some(assign) = assignment(&child, &inner, src) {
                                module.assignments.push(assign);
                            }
                        }
                        "call" => {
                            if let Expr::Call(call) = expr(&inner, src) {
                                module.calls.push(call);
                            }
                        }
                        _ => {}
                    }
                }
            }
            "import_statement" => module.imports.extend(import(&child, src)),
            "import_from_statement" => module.imports.extend(import_from(&child, src)),
            "if_statement" | "try_statement" | "with_statement" => {
                for block in compound_blocks(&child) {
                    collect_block(&block, src, module);
                }
            }
            _ => {}
        }
    }
}

fn compound_blocks<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut blocks = Vec::new();
    for child in named_children(node) {
        if child.kind() == "block" {
            blocks.push(child);
        } else if child.kind().ends_with("_clause") {
            blocks.extend(
                named_children(&child)
                    .into_iter()
                    .filter(|c| c.kind() == "block"),
            );
        }
    }
    blocks
}

fn class_def(node: &Node<'_>, decorated: Option<&Node<'_>>, src: &[u8]) -> ClassDef {
    let outer = decorated.unwrap_or(node);
    let name = node
        .child_by_field_name("name")
        .map(|n| text(&n, src).to_owned())
        .unwrap_or_default();

    let (bases, keywords) = node
        .child_by_field_name("superclasses")
        .map(|args| arguments(&args, src))
        .unwrap_or_default();

    let decorators = decorated
        .map(|d| {
            named_children(d)
                .into_iter()
                .filter(|c| c.kind() == "decorator")
                .filter_map(|c| named_children(&c).first().map(|e| expr(e, src)))
                .collect()
        })
        .unwrap_or_default();

    let mut body = Vec::new();
    let mut body_column = node.start_position().column + 4;
    if let Some(block) = node.child_by_field_name("body") {
        let stmts = named_children(&block);
        if let Some(first) = stmts.first() {
            body_column = first.start_position().column;
        }
        body = stmts.iter().map(|s| statement(s, src)).collect();
    }

    ClassDef {
        name,
        bases,
        keywords,
        decorators,
        line: start_line(outer),
        class_line: start_line(node),
        end_line: end_line(node),
        column: outer.start_position().column,
        body_column,
        body,
    }
}

fn statement(node: &Node<'_>, src: &[u8]) -> Stmt {
    let other = || Stmt::Other {
        line: start_line(node),
        end_line: end_line(node),
    };
    match node.kind() {
        "expression_statement" => named_children(node)
            .first()
            .filter(|inner| inner.kind() == "assignment")
            .and_then(|inner| assignment(node, inner, src))
            .map_or_else(other, Stmt::Assign),
        "class_definition" => Stmt::Class(class_def(node, None, src)),
        "function_definition" => function(node, node, src),
        "decorated_definition" => match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "class_definition" => {
                Stmt::Class(class_def(&def, Some(node), src))
            }
            Some(def) if def.kind() == "function_definition" => function(&def, node, src),
            _ => other(),
        },
        _ => other(),
    }
}

fn function(def: &Node<'_>, outer: &Node<'_>, src: &[u8]) -> Stmt {
    Stmt::Function {
        name: def
            .child_by_field_name("name")
            .map(|n| text(&n, src).to_owned())
            .unwrap_or_default(),
        line: start_line(outer),
        end_line: end_line(outer),
    }
}

/// Flattens `a = b = value` into its simple-name targets and final value.
fn assignment(stmt: &Node<'_>, node: &Node<'_>, src: &[u8]) -> Option<Assign> {
    let mut targets = Vec::new();
    let mut current = *node;
    loop {
        if let Some(left) = current.child_by_field_name("left") {
            if left.kind() == "identifier" {
                targets.push(text(&left, src).to_owned());
            }
        }
        match current.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => current = right,
            right => {
                if targets.is_empty() {
                    return None;
                }
                return Some(Assign {
                    targets,
                    value: right.map(|r| expr(&r, src)),
                    line: start_line(stmt),
                    end_line: end_line(stmt),
                    value_start: right.map_or_else(|| position(stmt), |r| position(&r)),
                    element_spans: element_spans(right),
                });
            }
        }
    }
}

fn arguments(node: &Node<'_>, src: &[u8]) -> (Vec<Expr>, Vec<Keyword>) {
    let mut args = Vec::new();
    let mut keywords = Vec::new();
    if node.kind() != "argument_list" {
        args.push(Expr::Other(text(node, src).to_owned()));
        return (args, keywords);
    }
    for child in named_children(node) {
        if child.kind() == "keyword_argument" {
            let name = child.child_by_field_name("name");
            let value = child.child_by_field_name("value");
            if let (Some(name), Some(value)) = (name, value) {
                keywords.push(Keyword {
                    name: text(&name, src).to_owned(),
                    value: expr(&value, src),
                });
            }
        } else {
            args.push(expr(&child, src));
        }
    }
    (args, keywords)
}

/// Converts an expression node into [`Expr`].
fn expr(node: &Node<'_>, src: &[u8]) -> Expr {
    let other = || Expr::Other(text(node, src).to_owned());
    match node.kind() {
        "identifier" => Expr::Name(text(node, src).to_owned()),
        "attribute" => {
            let object = node.child_by_field_name("object").map(|o| expr(&o, src));
            let attr = node.child_by_field_name("attribute");
            match (object.as_ref().and_then(Expr::dotted), attr) {
                (Some(base), Some(attr)) => {
                    Expr::Attribute(format!("{base}.{}", text(&attr, src)))
                }
                _ => other(),
            }
        }
        "call" => {
            let Some(func) = node.child_by_field_name("function") else {
                return other();
            };
            let (args, keywords) = node
                .child_by_field_name("arguments")
                .map(|a| arguments(&a, src))
                .unwrap_or_default();
            Expr::Call(Call {
                func: Box::new(expr(&func, src)),
                args,
                keywords,
            })
        }
        "string" => string_value(node, src).map_or_else(other, Expr::Str),
        "concatenated_string" => named_children(node)
            .iter()
            .map(|s| string_value(s, src))
            .collect::<Option<Vec<_>>>()
            .map_or_else(other, |parts| Expr::Str(parts.concat())),
        "integer" => parse_int(text(node, src)).map_or_else(other, Expr::Int),
        "float" => Expr::Float(text(node, src).to_owned()),
        "true" => Expr::Bool(true),
        "false" => Expr::Bool(false),
        "none" => Expr::None,
        "list" => Expr::List(named_children(node).iter().map(|c| expr(c, src)).collect()),
        "tuple" | "expression_list" => {
            Expr::Tuple(named_children(node).iter().map(|c| expr(c, src)).collect())
        }
        "parenthesized_expression" => named_children(node)
            .first()
            .map_or_else(other, |inner| expr(inner, src)),
        "dictionary" => Expr::Dict(
            named_children(node)
                .iter()
                .filter(|c| c.kind() == "pair")
                .filter_map(|pair| {
                    let key = pair.child_by_field_name("key")?;
                    let value = pair.child_by_field_name("value")?;
                    Some((expr(&key, src), expr(&value, src)))
                })
                .collect(),
        ),
        "unary_operator" => {
            let op = node.child_by_field_name("operator").map(|o| text(&o, src));
            let arg = node.child_by_field_name("argument").map(|a| expr(&a, src));
            match (op, arg) {
                (Some("-"), Some(Expr::Int(i))) => Expr::Int(-i),
                _ => other(),
            }
        }
        _ => other(),
    }
}

/// Literal content between the quotes. F-strings with interpolations are not literals.
fn string_value(node: &Node<'_>, src: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    if children.iter().any(|c| c.kind() == "interpolation") {
        return None;
    }
    let start = children.iter().find(|c| c.kind() == "string_start")?;
    let end = children.iter().rev().find(|c| c.kind() == "string_end")?;
    if start.end_byte() > end.start_byte() {
        return None;
    }
    std::str::from_utf8(&src[start.end_byte()..end.start_byte()])
        .ok()
        .map(str::to_owned)
}

fn parse_int(raw: &str) -> Option<i64> {
    let cleaned = raw.replace('_', "");
    let lower = cleaned.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        lower.parse().ok()
    }
}

fn import(node: &Node<'_>, src: &[u8]) -> Vec<Import> {
    let mut out = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            // `import a.b` binds `a`
            "dotted_name" => {
                let local = text(&child, src)
                    .split('.')
                    .next()
                    .unwrap_or_default()
                    .to_owned();
                out.push(Import {
                    target: local.clone(),
                    local,
                    level: 0,
                });
            }
            "aliased_import" => {
                if let (Some(name), Some(alias)) = (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("alias"),
                ) {
                    out.push(Import {
                        local: text(&alias, src).to_owned(),
                        target: text(&name, src).to_owned(),
                        level: 0,
                    });
                }
            }
            _ => {}
        }
    }
    out
}

fn import_from(node: &Node<'_>, src: &[u8]) -> Vec<Import> {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return Vec::new();
    };
    let (module, level) = if module_node.kind() == "relative_import" {
        let mut module = String::new();
        let mut level = 0;
        let mut cursor = module_node.walk();
        for part in module_node.children(&mut cursor) {
            match part.kind() {
                "import_prefix" => level = text(&part, src).chars().filter(|c| *c == '.').count(),
                "dotted_name" => module = text(&part, src).to_owned(),
                _ => {}
            }
        }
        (module, level)
    } else {
        (text(&module_node, src).to_owned(), 0)
    };

    let join = |name: &str| {
        if module.is_empty() {
            name.to_owned()
        } else {
            format!("{module}.{name}")
        }
    };

    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let name = text(&child, src);
                out.push(Import {
                    local: name.to_owned(),
                    target: join(name),
                    level,
                });
            }
            "aliased_import" => {
                if let (Some(name), Some(alias)) = (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("alias"),
                ) {
                    out.push(Import {
                        local: text(&alias, src).to_owned(),
                        target: join(text(&name, src)),
                        level,
                    });
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Module {
        PythonParser::new().parse(src).expect("parse should succeed")
    }

    #[test]
    fn extracts_class_with_fields() {
        let m = parse(
            r#"
from django.db import models

class Article(models.Model):
    title = models.CharField("title", max_length=100)
    body = models.TextField(help_text=_("text"))

    class Meta:
        db_table = "articles"
"#,
        );
        assert_eq!(m.classes.len(), 1);
        let class = &m.classes[0];
        assert_eq!(class.name, "Article");
        assert_eq!(class.bases, vec![Expr::Attribute("models.Model".into())]);
        assert_eq!(class.class_line, 4);
        assert_eq!(class.end_line, 9);
        assert_eq!(class.body_column, 4);

        let title = class.assignment("title").expect("title");
        let call = title.value.as_ref().and_then(Expr::as_call).expect("call");
        assert_eq!(call.func_name(), Some("models.CharField"));
        assert_eq!(call.args, vec![Expr::Str("title".into())]);
        assert_eq!(call.keyword("max_length"), Some(&Expr::Int(100)));
        assert_eq!(title.line, 5);

        let meta = class.nested_class("Meta").expect("meta");
        assert_eq!(meta.class_line, 8);
        assert!(meta.assignment("db_table").is_some());
    }

    #[test]
    fn extracts_imports() {
        let m = parse(
            "import os.path\nimport json as j\nfrom django.db import models\nfrom .models import Article as A\nfrom .. import utils\n",
        );
        let pairs: Vec<(&str, &str, usize)> = m
            .imports
            .iter()
            .map(|i| (i.local.as_str(), i.target.as_str(), i.level))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("os", "os", 0),
                ("j", "json", 0),
                ("models", "django.db.models", 0),
                ("A", "models.Article", 1),
                ("utils", "utils", 2),
            ]
        );
    }

    #[test]
    fn decorated_class_starts_at_decorator() {
        let m = parse("@admin.register(Author)\nclass AuthorAdmin(admin.ModelAdmin):\n    pass\n");
        let class = &m.classes[0];
        assert_eq!(class.line, 1);
        assert_eq!(class.class_line, 2);
        assert_eq!(class.decorators.len(), 1);
        assert!(matches!(&class.decorators[0], Expr::Call(c) if c.func_name() == Some("admin.register")));
    }

    #[test]
    fn finds_classes_inside_if_blocks() {
        let m = parse("if True:\n    class Nested(Base):\n        x = 1\n");
        assert_eq!(m.classes.len(), 1);
        assert_eq!(m.classes[0].column, 4);
    }

    #[test]
    fn collects_module_calls_and_assignments() {
        let m = parse("CHOICES = [(1, 'a'), (-2, 'b')]\nadmin.site.register(Author)\n");
        let choices = m.assignment("CHOICES").expect("assignment");
        let items = choices.value.as_ref().and_then(Expr::elements).expect("list");
        assert_eq!(items[1], Expr::Tuple(vec![Expr::Int(-2), Expr::Str("b".into())]));
        assert_eq!(m.calls.len(), 1);
        assert_eq!(m.calls[0].func_name(), Some("admin.site.register"));
    }

    #[test]
    fn list_elements_carry_spans() {
        let m = parse("x = [a(1),\n     b(name=\"n\")]\ny = 1\n");
        let spans = &m.assignment("x").expect("assignment").element_spans;
        assert_eq!(
            spans,
            &vec![
                Span {
                    start: Position { line: 1, column: 5 },
                    end: Position { line: 1, column: 9 },
                },
                Span {
                    start: Position { line: 2, column: 5 },
                    end: Position { line: 2, column: 16 },
                },
            ]
        );
        assert!(m.assignment("y").expect("assignment").element_spans.is_empty());
    }

    #[test]
    fn chained_assignment_binds_all_targets() {
        let m = parse("class A:\n    x = y = None\n");
        let assign = m.classes[0].assignments().next().expect("assign");
        assert_eq!(assign.targets, vec!["x".to_owned(), "y".to_owned()]);
        assert_eq!(assign.value, Some(Expr::None));
    }

    #[test]
    fn fstring_is_not_a_literal() {
        let m = parse("x = f\"{a}\"\ny = 'plain' \"joined\"\n");
        assert!(matches!(m.assignment("x").and_then(|a| a.value.clone()), Some(Expr::Other(_))));
        assert_eq!(
            m.assignment("y").and_then(|a| a.value.clone()),
            Some(Expr::Str("plainjoined".into()))
        );
    }

    #[test]
    fn syntax_errors_are_reported_not_fatal() {
        let m = parse("class A(:\n    x = 1\n");
        assert!(m.has_errors);
    }
}
