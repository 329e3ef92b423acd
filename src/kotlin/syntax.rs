//! tree-sitter plumbing shared by the Kotlin and Java readers.

use tree_sitter::{Language, Node, Parser, Tree};

/// The grammar a source file is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Kotlin,
    Java,
}

impl Grammar {
    fn language(self) -> Language {
        match self {
            Grammar::Kotlin => tree_sitter_kotlin_ng::LANGUAGE.into(),
            Grammar::Java => tree_sitter_java::LANGUAGE.into(),
        }
    }
}

/// Parse `source`.  Syntax errors still produce a tree; `None` only when
/// the grammar cannot be loaded.
pub fn parse(source: &str, grammar: Grammar) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&grammar.language()) {
        tracing::error!("cannot load the {:?} grammar: {}", grammar, e);
        return None;
    }
    parser.parse(source, None)
}

/// All children of `node`, named and anonymous.
pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

/// Node text with runs of whitespace collapsed to one space.
pub fn normalized_text(source: &str, start: usize, end: usize) -> String {
    source
        .get(start..end)
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_identifier(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "identifier" | "simple_identifier" | "type_identifier"
    )
}

pub fn is_comment(node: Node<'_>) -> bool {
    node.kind().ends_with("comment")
}

/// Identifier text without backticks.
pub fn identifier_text(node: Node<'_>, source: &str) -> String {
    text(node, source).trim_matches('`').to_string()
}

pub fn child_of_kind<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    children(node)
        .into_iter()
        .find(|child| kinds.contains(&child.kind()))
}

/// The declared name: the `name` field, else the first identifier child.
pub fn name_node(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("name")
        .or_else(|| children(node).into_iter().find(|c| is_identifier(*c)))
}

/// Keywords of the `modifiers` child; annotations are skipped.
pub fn modifier_words(node: Node<'_>, source: &str) -> Vec<String> {
    let Some(modifiers) = child_of_kind(node, &["modifiers"]) else {
        return Vec::new();
    };
    children(modifiers)
        .into_iter()
        .filter(|m| !m.kind().contains("annotation") && !is_comment(*m))
        .flat_map(|m| {
            text(m, source)
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_grammars() {
        let kotlin = parse("class A(val x: Int)\n", Grammar::Kotlin).unwrap();
        assert!(!kotlin.root_node().has_error());
        let java = parse("class A { A(int x) {} }\n", Grammar::Java).unwrap();
        assert!(!java.root_node().has_error());
    }

    #[test]
    fn reads_class_name_and_modifiers() {
        let source = "@Keep private abstract class Base\n";
        let tree = parse(source, Grammar::Kotlin).unwrap();
        let class = children(tree.root_node())
            .into_iter()
            .find(|n| n.kind() == "class_declaration")
            .unwrap();
        assert_eq!(identifier_text(name_node(class).unwrap(), source), "Base");
        let words = modifier_words(class, source);
        assert!(words.contains(&"abstract".to_string()));
        assert!(!words.iter().any(|w| w.contains("Keep")));
    }
}
