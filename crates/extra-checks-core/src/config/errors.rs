//! Structured configuration error tree.

use std::collections::BTreeMap;

/// One entry of an [`ErrorTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorNode {
    /// Leaf messages.
    Messages(Vec<String>),
    /// Nested errors, e.g. per check and then per setting.
    Nested(ErrorTree),
}

/// Errors addressed by field path, e.g. `checks → model-attribute → attrs`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTree(BTreeMap<String, ErrorNode>);

impl ErrorTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a message under `field`.
    ///
    /// A field that already holds nested errors keeps them; the message is
    /// not recorded.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let node = self
            .0
            .entry(field.into())
            .or_insert_with(|| ErrorNode::Messages(Vec::new()));
        if let ErrorNode::Messages(messages) = node {
            messages.push(message.into());
        }
    }

    /// Stores a nested tree under `field`, replacing what was there.
    pub fn nest(&mut self, field: impl Into<String>, tree: ErrorTree) {
        self.0.insert(field.into(), ErrorNode::Nested(tree));
    }

    /// Looks up the node stored under `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&ErrorNode> {
        self.0.get(field)
    }

    /// Renders the tree as indented bullet lines.
    ///
    /// Every level indents by two spaces; leaf messages sit one level
    /// deeper than their field. Empty entries are skipped.
    #[must_use]
    pub fn render(&self) -> String {
        self.render_level(0)
    }

    fn render_level(&self, level: usize) -> String {
        let mut output = Vec::new();
        for (field, node) in &self.0 {
            match node {
                ErrorNode::Messages(messages) if messages.is_empty() => continue,
                ErrorNode::Nested(tree) if tree.is_empty() => continue,
                _ => {}
            }
            output.push(format!("{}* {field}", " ".repeat(level * 2)));
            match node {
                ErrorNode::Nested(tree) => output.push(tree.render_level(level + 1)),
                ErrorNode::Messages(messages) => {
                    let indent = " ".repeat(level * 2 + 2);
                    output.push(
                        messages
                            .iter()
                            .map(|m| format!("{indent}* {m}"))
                            .collect::<Vec<_>>()
                            .join("\n"),
                    );
                }
            }
        }
        output.join("\n")
    }
}

impl std::fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_paths() {
        let mut attrs = ErrorTree::new();
        attrs.add("attrs", "This field is required.");
        let mut checks = ErrorTree::new();
        checks.nest("model-attribute", attrs);
        let mut tree = ErrorTree::new();
        tree.nest("checks", checks);
        tree.add("include_apps", "Enter a list of values.");

        insta::assert_snapshot!(tree.render(), @r"
        * checks
          * model-attribute
            * attrs
              * This field is required.
        * include_apps
          * Enter a list of values.
        ");
    }

    #[test]
    fn skips_empty_entries() {
        let mut tree = ErrorTree::new();
        tree.nest("checks", ErrorTree::new());
        tree.add("level", "bad");
        insta::assert_snapshot!(tree.render(), @r"
        * level
          * bad
        ");
    }

    #[test]
    fn empty_tree_renders_nothing() {
        assert_eq!(ErrorTree::new().render(), "");
        assert!(ErrorTree::new().is_empty());
    }
}
