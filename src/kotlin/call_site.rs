//! Locating the call under the cursor.
//!
//! Given a document and a byte offset, [`locate`] finds the call whose
//! argument list should be filled and describes it as a [`Callee`] plus an
//! [`ArgumentListSite`].  The cursor may sit on the callee name
//! (`fo|o(1)`) or anywhere inside the parentheses (`foo(1, |)`); in the
//! latter case the innermost enclosing call wins.
//!
//! The document is parsed with the Kotlin grammar and the search walks up
//! from the node at the cursor.  Lambda bodies, blocks and declarations
//! end it.  Comments inside the parentheses are attached to the
//! neighbouring argument so a re-layout can keep them.

use tree_sitter::Node;

use crate::kotlin::syntax::{self, Grammar};
use crate::kotlin::type_text::{self, TypeSyntax};
use crate::types::{ArgumentComments, ArgumentListSite, Callee, ExistingArgument};

/// Nodes the search never leaves.
const BOUNDARIES: &[&str] = &[
    "source_file",
    "lambda_literal",
    "statements",
    "block",
    "function_body",
    "class_body",
    "enum_class_body",
    "class_parameters",
    "function_value_parameters",
    "primary_constructor",
    "indexing_suffix",
    "collection_literal",
    "annotation",
    "function_declaration",
    "class_declaration",
    "object_declaration",
    "secondary_constructor",
    "property_declaration",
    "companion_object",
    "enum_entry",
    "type_alias",
    "getter",
    "setter",
    "anonymous_initializer",
];

/// Find the call at `offset`.
pub fn locate(source: &str, offset: usize) -> Option<(Callee, ArgumentListSite)> {
    let tree = syntax::parse(source, Grammar::Kotlin)?;
    let offset = offset.min(source.len());
    let mut node = tree.root_node().descendant_for_byte_range(offset, offset)?;
    loop {
        let found = match node.kind() {
            "call_expression" => call(source, node),
            // `@Json(name = "x")`
            "constructor_invocation" if node.parent().is_some_and(|p| p.kind() == "annotation") => {
                return None;
            }
            "constructor_invocation" => constructor_invocation(source, node),
            kind if BOUNDARIES.contains(&kind) => return None,
            _ => None,
        };
        if found.is_some() {
            return found;
        }
        node = node.parent()?;
    }
}

/// `callee(args)`, `a.b.callee<T>(args) { lambda }`
fn call(source: &str, node: Node<'_>) -> Option<(Callee, ArgumentListSite)> {
    let parts = syntax::children(node);
    let callee_node = parts
        .iter()
        .copied()
        .find(|n| n.is_named() && !syntax::is_comment(*n))?;
    let suffix: Vec<Node<'_>> = parts
        .iter()
        .flat_map(|n| {
            if n.kind() == "call_suffix" {
                syntax::children(*n)
            } else {
                vec![*n]
            }
        })
        .collect();
    let arguments = suffix.iter().copied().find(|n| n.kind() == "value_arguments")?;
    let has_trailing_lambda = suffix.iter().any(|n| {
        matches!(n.kind(), "annotated_lambda" | "lambda_literal")
            && n.start_byte() >= arguments.end_byte()
    });
    let callee = callee(source, callee_node)?;
    Some((callee, site(source, arguments, has_trailing_lambda)?))
}

fn callee(source: &str, node: Node<'_>) -> Option<Callee> {
    if syntax::is_identifier(node) {
        return Some(Callee {
            name: syntax::identifier_text(node, source),
            qualifier: None,
        });
    }
    // `this(...)`, `(f)(...)` and other callees name nothing
    if node.kind() != "navigation_expression" {
        return None;
    }
    let last = syntax::children(node)
        .into_iter()
        .filter(|n| n.is_named() && !syntax::is_comment(*n))
        .last()?;
    let name = if syntax::is_identifier(last) {
        last
    } else if last.kind() == "navigation_suffix" {
        syntax::children(last)
            .into_iter()
            .find(|n| syntax::is_identifier(*n))?
    } else {
        return None;
    };
    let receiver = source.get(node.start_byte()..name.start_byte())?.trim_end();
    let receiver = receiver.strip_suffix('.')?.trim_end();
    let receiver = receiver.strip_suffix('?').unwrap_or(receiver).trim();
    Some(Callee {
        name: syntax::identifier_text(name, source),
        qualifier: (!receiver.is_empty()).then(|| receiver.to_string()),
    })
}

/// A supertype call in a class header: `class B : Base(1)`.
fn constructor_invocation(source: &str, node: Node<'_>) -> Option<(Callee, ArgumentListSite)> {
    let ty = syntax::children(node)
        .into_iter()
        .find(|n| n.is_named() && n.kind() != "value_arguments")?;
    let Some(TypeSyntax::Named { path, .. }) = type_text::from_node(ty, source) else {
        return None;
    };
    let (qualifier, name) = match path.rsplit_once('.') {
        Some((qualifier, name)) => (Some(qualifier.to_string()), name.to_string()),
        None => (None, path),
    };
    let arguments = syntax::child_of_kind(node, &["value_arguments"])?;
    Some((Callee { name, qualifier }, site(source, arguments, false)?))
}

/// Pieces of an argument list in source order.
enum Piece<'t> {
    Argument(Node<'t>, std::ops::Range<usize>),
    Comma(usize),
    Comment(Node<'t>),
}

fn site(source: &str, list: Node<'_>, has_trailing_lambda: bool) -> Option<ArgumentListSite> {
    let parts = syntax::children(list);
    let open = parts.first().filter(|n| n.kind() == "(")?;
    let close = parts
        .last()
        .filter(|n| n.kind() == ")" && !n.is_missing())?;
    if source.as_bytes().get(close.start_byte()) != Some(&b')') {
        return None;
    }

    let mut pieces = Vec::new();
    for part in &parts[1..parts.len() - 1] {
        match part.kind() {
            "," => pieces.push(Piece::Comma(part.end_byte())),
            "value_argument" => {
                // Comments at either end of the argument node are not part of its text.
                let inner = syntax::children(*part);
                let first = inner.iter().position(|n| !syntax::is_comment(*n));
                let last = inner.iter().rposition(|n| !syntax::is_comment(*n));
                let (Some(first), Some(last)) = (first, last) else {
                    pieces.extend(inner.into_iter().map(Piece::Comment));
                    continue;
                };
                pieces.extend(inner[..first].iter().copied().map(Piece::Comment));
                pieces.push(Piece::Argument(
                    *part,
                    inner[first].start_byte()..inner[last].end_byte(),
                ));
                pieces.extend(inner[last + 1..].iter().copied().map(Piece::Comment));
            }
            _ if syntax::is_comment(*part) => pieces.push(Piece::Comment(*part)),
            _ => {}
        }
    }

    let mut arguments: Vec<ExistingArgument> = Vec::new();
    let mut pending = Vec::new();
    let mut after_comma = false;
    let mut last_end = open.end_byte();
    let mut trailing_comma_end = None;

    for piece in pieces {
        match piece {
            Piece::Argument(node, span) => {
                arguments.push(ExistingArgument {
                    name: argument_name(source, node),
                    text: source.get(span.clone())?.to_string(),
                    span: span.clone(),
                    comments: ArgumentComments {
                        leading: std::mem::take(&mut pending),
                        ..ArgumentComments::default()
                    },
                });
                after_comma = false;
                trailing_comma_end = None;
                last_end = span.end;
            }
            Piece::Comma(end) => {
                after_comma = true;
                trailing_comma_end = (!arguments.is_empty()).then_some(end);
                last_end = end;
            }
            Piece::Comment(node) => {
                let text = syntax::text(node, source).trim_end().to_string();
                let same_line = source
                    .get(last_end..node.start_byte())
                    .is_none_or(|gap| !gap.contains('\n'));
                match arguments.last_mut() {
                    Some(argument) if same_line && !after_comma => {
                        argument.comments.inline.push(text)
                    }
                    Some(argument) if same_line => argument.comments.trailing.push(text),
                    _ => pending.push(text),
                }
                last_end = node.end_byte();
            }
        }
    }

    Some(ArgumentListSite {
        open_paren: open.start_byte(),
        close_paren: close.start_byte(),
        arguments,
        trailing_comma_end,
        has_trailing_lambda,
        line_indent: line_indent(source, open.start_byte()),
        dangling_comments: pending,
    })
}

/// `name = value` gives `name`; the name may be backticked.
fn argument_name(source: &str, argument: Node<'_>) -> Option<String> {
    let parts = syntax::children(argument);
    let equals = parts.iter().position(|n| n.kind() == "=")?;
    parts[..equals]
        .iter()
        .rev()
        .find(|n| syntax::is_identifier(**n))
        .map(|n| syntax::identifier_text(*n, source))
}

/// Leading whitespace of the line containing `offset`.
fn line_indent(source: &str, offset: usize) -> String {
    let bytes = source.as_bytes();
    let start = memchr::memrchr(b'\n', &bytes[..offset]).map_or(0, |p| p + 1);
    source[start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}
