//! Java sources in a mixed project.
//!
//! Kotlin code may call Java constructors and methods.  Those members are
//! indexed so that such calls resolve, but every candidate they produce is
//! [`Origin::Foreign`] and is never filled.  Files are parsed with
//! tree-sitter-java; only type declarations and their direct members are
//! read, never method bodies or initializers.

use tree_sitter::Node;

use crate::fill::import_edit::ImportScope;
use crate::kotlin::declarations::{
    ClassDecl, ClassKind, ConstructorDecl, FileDeclarations, FunctionDecl, ParamDecl,
};
use crate::kotlin::syntax::{self, Grammar};
use crate::kotlin::type_text::TypeSyntax;
use crate::types::{Modality, Origin};

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

/// Scan a Java source file.
pub fn scan(source: &str) -> FileDeclarations {
    let mut decls = FileDeclarations {
        scope: ImportScope::from_source(source),
        origin: Origin::Foreign,
        ..FileDeclarations::default()
    };
    let Some(tree) = syntax::parse(source, Grammar::Java) else {
        tracing::warn!("Java source left unindexed");
        return decls;
    };
    for node in syntax::children(tree.root_node()) {
        if TYPE_DECLARATIONS.contains(&node.kind()) {
            type_declaration(node, source, "", &mut decls);
        }
    }
    decls.add_default_constructors();
    decls
}

fn type_declaration(node: Node<'_>, source: &str, outer: &str, decls: &mut FileDeclarations) {
    let Some(name) = node.child_by_field_name("name") else {
        return;
    };
    let name = format!("{}{}", outer, syntax::text(name, source));
    let words = syntax::modifier_words(node, source);
    let kind = match node.kind() {
        "interface_declaration" | "annotation_type_declaration" => ClassKind::Interface,
        "enum_declaration" => ClassKind::Enum,
        _ => ClassKind::Class,
    };
    let modality = if kind == ClassKind::Interface || words.iter().any(|w| w == "abstract") {
        Modality::Abstract
    } else if words.iter().any(|w| w == "sealed") {
        Modality::Sealed
    } else {
        Modality::Concrete
    };

    let index = decls.classes.len();
    decls.classes.push(ClassDecl {
        name: name.clone(),
        kind,
        modality,
        constructors: Vec::new(),
        enum_entries: Vec::new(),
    });
    if node.kind() == "record_declaration"
        && let Some(components) = node.child_by_field_name("parameters")
    {
        decls.classes[index].constructors.push(ConstructorDecl {
            parameters: parameters(components, source),
            is_primary: true,
        });
    }

    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    let nested = format!("{}.", name);
    for member in members(body) {
        match member.kind() {
            "enum_constant" => {
                if let Some(constant) = member.child_by_field_name("name") {
                    let constant = syntax::text(constant, source).to_string();
                    decls.classes[index].enum_entries.push(constant);
                }
            }
            "constructor_declaration" => {
                let parameters = member
                    .child_by_field_name("parameters")
                    .map(|list| parameters(list, source))
                    .unwrap_or_default();
                decls.classes[index].constructors.push(ConstructorDecl {
                    parameters,
                    is_primary: false,
                });
            }
            "method_declaration" => {
                let (Some(method), Some(list)) = (
                    member.child_by_field_name("name"),
                    member.child_by_field_name("parameters"),
                ) else {
                    continue;
                };
                decls.functions.push(FunctionDecl {
                    name: syntax::text(method, source).to_string(),
                    receiver: None,
                    owner: Some(name.clone()),
                    parameters: parameters(list, source),
                });
            }
            kind if TYPE_DECLARATIONS.contains(&kind) => {
                type_declaration(member, source, &nested, decls);
            }
            _ => {}
        }
    }
}

/// Members of a type body; an enum's members follow its constants.
fn members(body: Node<'_>) -> Vec<Node<'_>> {
    let mut members = Vec::new();
    for child in syntax::children(body) {
        if child.kind() == "enum_body_declarations" {
            members.extend(syntax::children(child));
        } else {
            members.push(child);
        }
    }
    members
}

/// `(Type a, final @Ann Type... b)`
fn parameters(list: Node<'_>, source: &str) -> Vec<ParamDecl> {
    let mut parameters = Vec::new();
    for child in syntax::children(list) {
        match child.kind() {
            "formal_parameter" => {
                let (Some(ty), Some(name)) = (
                    child.child_by_field_name("type"),
                    child.child_by_field_name("name"),
                ) else {
                    continue;
                };
                parameters.push(parameter(name, ty, source, false));
            }
            "spread_parameter" => {
                let parts = syntax::children(child);
                let ty = parts.iter().copied().find(|p| {
                    p.is_named() && !matches!(p.kind(), "modifiers" | "variable_declarator")
                });
                let name = parts
                    .iter()
                    .find(|p| p.kind() == "variable_declarator")
                    .and_then(|d| d.child_by_field_name("name"));
                if let (Some(ty), Some(name)) = (ty, name) {
                    parameters.push(parameter(name, ty, source, true));
                }
            }
            _ => {}
        }
    }
    parameters
}

fn parameter(name: Node<'_>, ty: Node<'_>, source: &str, is_vararg: bool) -> ParamDecl {
    ParamDecl {
        name: syntax::text(name, source).to_string(),
        type_text: syntax::normalized_text(source, ty.start_byte(), ty.end_byte()),
        type_syntax: type_syntax(ty, source),
        is_vararg,
        has_default: false,
    }
}

/// A Java type in the Kotlin type model: `T[]` reads as `Array<T>` and a
/// wildcard as `Any?`.
fn type_syntax(node: Node<'_>, source: &str) -> Option<TypeSyntax> {
    let named = |path: &str, arguments| TypeSyntax::Named {
        path: path.to_string(),
        arguments,
        nullable: false,
    };
    match node.kind() {
        "generic_type" => {
            let base = syntax::children(node)
                .into_iter()
                .find(|c| matches!(c.kind(), "type_identifier" | "scoped_type_identifier"))?;
            let arguments = syntax::child_of_kind(node, &["type_arguments"])
                .map(|args| {
                    syntax::children(args)
                        .into_iter()
                        .filter(|a| a.is_named())
                        .filter_map(|a| type_syntax(a, source))
                        .collect()
                })
                .unwrap_or_default();
            Some(named(syntax::text(base, source), arguments))
        }
        "array_type" => {
            let element = node
                .child_by_field_name("element")
                .and_then(|e| type_syntax(e, source))?;
            Some(named("Array", vec![element]))
        }
        "wildcard" => Some(TypeSyntax::Named {
            path: "Any".to_string(),
            arguments: Vec::new(),
            nullable: true,
        }),
        "annotated_type" => {
            let inner = syntax::children(node)
                .into_iter()
                .filter(|c| c.is_named() && !c.kind().contains("annotation"))
                .last()?;
            type_syntax(inner, source)
        }
        _ => {
            let text = syntax::text(node, source);
            (!text.is_empty()).then(|| named(text, Vec::new()))
        }
    }
}
