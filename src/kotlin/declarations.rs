//! Kotlin declarations read from the syntax tree.
//!
//! [`scan`] parses a file with the tree-sitter Kotlin grammar and walks it
//! once.  Class bodies pass their class down the walk so that nested
//! classes get their `Outer.Inner` names, and secondary constructors and
//! member functions know their owner.  Function bodies, lambdas and
//! object literals reset the owner.

use tree_sitter::Node;

use crate::fill::import_edit::ImportScope;
use crate::kotlin::syntax::{self, Grammar};
use crate::kotlin::type_text::{self, TypeSyntax};
use crate::types::{Modality, Origin};

/// What kind of classifier a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    /// The type as written, whitespace collapsed.
    pub type_text: String,
    /// `None` when the type node could not be read.
    pub type_syntax: Option<TypeSyntax>,
    pub is_vararg: bool,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDecl {
    pub parameters: Vec<ParamDecl>,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    /// Name relative to the package, `Outer.Inner` for nested classes.
    pub name: String,
    pub kind: ClassKind,
    pub modality: Modality,
    pub constructors: Vec<ConstructorDecl>,
    /// Enum entries in declaration order.
    pub enum_entries: Vec<String>,
}

impl ClassDecl {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    /// Receiver type text of an extension function.
    pub receiver: Option<String>,
    /// Class whose body declares the function.
    pub owner: Option<String>,
    pub parameters: Vec<ParamDecl>,
}

/// Everything the index knows about one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDeclarations {
    pub scope: ImportScope,
    pub classes: Vec<ClassDecl>,
    pub functions: Vec<FunctionDecl>,
    pub origin: Origin,
}

impl FileDeclarations {
    /// Give every class that declares no constructor at all the implicit
    /// no-argument one.
    pub(crate) fn add_default_constructors(&mut self) {
        for class in &mut self.classes {
            if class.kind == ClassKind::Class && class.constructors.is_empty() {
                class.constructors.push(ConstructorDecl {
                    parameters: Vec::new(),
                    is_primary: true,
                });
            }
        }
    }
}

/// Nodes whose contents are not class members.
const LOCAL_SCOPES: &[&str] = &[
    "function_body",
    "lambda_literal",
    "object_literal",
    "anonymous_initializer",
    "property_declaration",
    "getter",
    "setter",
    "block",
    "statements",
];

/// Scan a Kotlin source file.
pub fn scan(source: &str) -> FileDeclarations {
    let mut reader = Reader {
        source,
        decls: FileDeclarations {
            scope: ImportScope::from_source(source),
            ..FileDeclarations::default()
        },
    };
    match syntax::parse(source, Grammar::Kotlin) {
        Some(tree) => reader.visit(tree.root_node(), None),
        None => tracing::warn!("Kotlin source left unindexed"),
    }
    let mut decls = reader.decls;
    decls.add_default_constructors();
    decls
}

struct Reader<'s> {
    source: &'s str,
    decls: FileDeclarations,
}

impl Reader<'_> {
    /// `owner` is the class whose body directly contains `node`.
    fn visit(&mut self, node: Node<'_>, owner: Option<usize>) {
        match node.kind() {
            "class_declaration" | "object_declaration" => self.class(node, owner),
            "companion_object" => {
                for child in syntax::children(node) {
                    self.visit(child, owner);
                }
            }
            "function_declaration" => {
                self.function(node, owner);
                self.visit_children(node, None);
            }
            "secondary_constructor" => {
                self.secondary_constructor(node, owner);
                self.visit_children(node, None);
            }
            kind if LOCAL_SCOPES.contains(&kind) => self.visit_children(node, None),
            _ => self.visit_children(node, owner),
        }
    }

    fn visit_children(&mut self, node: Node<'_>, owner: Option<usize>) {
        for child in syntax::children(node) {
            self.visit(child, owner);
        }
    }

    fn class(&mut self, node: Node<'_>, owner: Option<usize>) {
        let Some(name) = syntax::name_node(node) else {
            self.visit_children(node, None);
            return;
        };
        let words = syntax::modifier_words(node, self.source);
        let has_word = |word: &str| words.iter().any(|w| w == word);
        let keywords: Vec<&str> = syntax::children(node)
            .iter()
            .filter(|c| !c.is_named())
            .map(|c| c.kind())
            .collect();
        let body = syntax::child_of_kind(node, &["class_body", "enum_class_body"]);

        let kind = if node.kind() == "object_declaration" {
            ClassKind::Object
        } else if keywords.contains(&"interface") {
            ClassKind::Interface
        } else if has_word("enum")
            || keywords.contains(&"enum")
            || body.is_some_and(|b| b.kind() == "enum_class_body")
        {
            ClassKind::Enum
        } else {
            ClassKind::Class
        };
        let modality = if kind == ClassKind::Interface || has_word("abstract") {
            Modality::Abstract
        } else if has_word("sealed") {
            Modality::Sealed
        } else {
            Modality::Concrete
        };

        let prefix = owner
            .map(|o| format!("{}.", self.decls.classes[o].name))
            .unwrap_or_default();
        let index = self.decls.classes.len();
        self.decls.classes.push(ClassDecl {
            name: format!("{}{}", prefix, syntax::identifier_text(name, self.source)),
            kind,
            modality,
            constructors: Vec::new(),
            enum_entries: Vec::new(),
        });

        if matches!(kind, ClassKind::Class | ClassKind::Enum) {
            let primary = syntax::child_of_kind(node, &["primary_constructor"]);
            let list = primary
                .and_then(|p| syntax::child_of_kind(p, &["class_parameters"]))
                .or(primary)
                .or_else(|| syntax::child_of_kind(node, &["class_parameters"]));
            if let Some(list) = list {
                let parameters = self.parameters(list);
                self.decls.classes[index].constructors.push(ConstructorDecl {
                    parameters,
                    is_primary: true,
                });
            }
        }

        let Some(body) = body else {
            return;
        };
        if kind == ClassKind::Enum {
            self.decls.classes[index].enum_entries = self.enum_entries(body);
        }
        self.visit_children(body, Some(index));
    }

    fn enum_entries(&self, body: Node<'_>) -> Vec<String> {
        let mut entries = Vec::new();
        for child in syntax::children(body) {
            let nodes = if child.kind() == "enum_entries" {
                syntax::children(child)
            } else {
                vec![child]
            };
            for entry in nodes.into_iter().filter(|n| n.kind() == "enum_entry") {
                if let Some(name) = syntax::name_node(entry) {
                    entries.push(syntax::identifier_text(name, self.source));
                }
            }
        }
        entries
    }

    fn secondary_constructor(&mut self, node: Node<'_>, owner: Option<usize>) {
        let (Some(class), Some(list)) = (
            owner,
            syntax::child_of_kind(node, &["function_value_parameters"]),
        ) else {
            return;
        };
        let parameters = self.parameters(list);
        self.decls.classes[class].constructors.push(ConstructorDecl {
            parameters,
            is_primary: false,
        });
    }

    /// `fun [<T>] [Receiver.]name(params)`
    fn function(&mut self, node: Node<'_>, owner: Option<usize>) {
        let Some(list) = syntax::child_of_kind(node, &["function_value_parameters"]) else {
            return;
        };
        let parts = syntax::children(node);
        let name = node.child_by_field_name("name").or_else(|| {
            parts
                .iter()
                .take_while(|p| p.id() != list.id())
                .filter(|p| syntax::is_identifier(**p))
                .last()
                .copied()
        });
        let Some(name) = name else {
            return;
        };
        let receiver = parts
            .iter()
            .take_while(|p| p.start_byte() < name.start_byte())
            .find(|p| {
                p.is_named()
                    && !syntax::is_comment(**p)
                    && !matches!(p.kind(), "modifiers" | "type_parameters")
            })
            .map(|r| syntax::normalized_text(self.source, r.start_byte(), r.end_byte()));
        let parameters = self.parameters(list);
        self.decls.functions.push(FunctionDecl {
            name: syntax::identifier_text(name, self.source),
            receiver,
            owner: owner.map(|o| self.decls.classes[o].name.clone()),
            parameters,
        });
    }

    /// Parameters of a `class_parameters` or `function_value_parameters`
    /// list.  Some grammars hang modifiers and default values beside the
    /// parameter node, so the list is split at its commas first.
    fn parameters(&self, list: Node<'_>) -> Vec<ParamDecl> {
        let mut parameters = Vec::new();
        let mut group = Vec::new();
        for child in syntax::children(list) {
            match child.kind() {
                "(" => {}
                "," | ")" => {
                    parameters.extend(self.parameter(&group));
                    group.clear();
                }
                _ if syntax::is_comment(child) => {}
                _ => group.push(child),
            }
        }
        parameters.extend(self.parameter(&group));
        parameters
    }

    /// One `[annotations] [modifiers] name: Type [= default]` group.
    fn parameter(&self, group: &[Node<'_>]) -> Option<ParamDecl> {
        let mut nodes = Vec::new();
        for node in group {
            if node.kind() == "function_value_parameter" {
                nodes.extend(syntax::children(*node));
            } else {
                nodes.push(*node);
            }
        }
        let param = nodes
            .iter()
            .copied()
            .find(|n| matches!(n.kind(), "class_parameter" | "parameter"))?;
        let inner = syntax::children(param);
        let all = || nodes.iter().chain(inner.iter());

        let has_default = all().any(|n| n.kind() == "=");
        let is_vararg = all().any(|n| {
            n.kind() == "vararg"
                || (n.kind().contains("modifier")
                    && syntax::text(*n, self.source)
                        .split_whitespace()
                        .any(|w| w == "vararg"))
        });

        let colon = inner.iter().position(|n| n.kind() == ":")?;
        let name = param.child_by_field_name("name").or_else(|| {
            inner[..colon]
                .iter()
                .rev()
                .find(|n| syntax::is_identifier(**n))
                .copied()
        })?;
        let after_colon: Vec<Node<'_>> = inner[colon + 1..]
            .iter()
            .copied()
            .take_while(|n| n.kind() != "=")
            .filter(|n| n.is_named() && !syntax::is_comment(*n))
            .collect();
        let first = *after_colon.first()?;
        let type_node = param.child_by_field_name("type").or_else(|| {
            after_colon
                .iter()
                .copied()
                .find(|n| n.kind() != "type_modifiers")
        })?;

        Some(ParamDecl {
            name: syntax::identifier_text(name, self.source),
            type_text: syntax::normalized_text(
                self.source,
                first.start_byte(),
                type_node.end_byte(),
            ),
            type_syntax: type_text::from_node(type_node, self.source),
            is_vararg,
            has_default,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class<'a>(decls: &'a FileDeclarations, name: &str) -> &'a ClassDecl {
        decls
            .classes
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("no class {}", name))
    }

    fn param_names(params: &[ParamDecl]) -> Vec<&str> {
        params.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn data_class_primary_constructor() {
        let decls = scan(
            "package com.example\n\ndata class User(val name: String, var age: Int = 0, private val tags: Map<String, List<Int>>)\n",
        );
        assert_eq!(decls.scope.package, "com.example");
        let user = class(&decls, "User");
        assert_eq!(user.kind, ClassKind::Class);
        assert_eq!(user.constructors.len(), 1);
        let params = &user.constructors[0].parameters;
        assert_eq!(param_names(params), vec!["name", "age", "tags"]);
        assert_eq!(params[0].type_text, "String");
        assert!(params[1].has_default);
        assert!(!params[0].has_default);
        assert_eq!(params[2].type_text, "Map<String, List<Int>>");
    }

    #[test]
    fn modalities_and_kinds() {
        let decls = scan(
            "abstract class A\nsealed class S\nopen class O\ninterface I\nfun interface F { fun run() }\nobject Singleton\nenum class Color { RED, GREEN }\n",
        );
        assert_eq!(class(&decls, "A").modality, Modality::Abstract);
        assert_eq!(class(&decls, "S").modality, Modality::Sealed);
        assert_eq!(class(&decls, "O").modality, Modality::Concrete);
        assert_eq!(class(&decls, "I").kind, ClassKind::Interface);
        assert_eq!(class(&decls, "I").modality, Modality::Abstract);
        assert_eq!(class(&decls, "F").kind, ClassKind::Interface);
        assert_eq!(class(&decls, "Singleton").kind, ClassKind::Object);
        assert_eq!(class(&decls, "Color").kind, ClassKind::Enum);
        assert_eq!(class(&decls, "Color").enum_entries, vec!["RED", "GREEN"]);
    }

    #[test]
    fn enum_entries_with_arguments_and_bodies() {
        let decls = scan(
            "enum class Planet(val mass: Double) {\n    @Deprecated(\"x\") MERCURY(3.3) { override fun x() = 1 },\n    VENUS(4.8);\n\n    fun describe() = name\n}\nenum class Empty { ; fun f() {} }\n",
        );
        assert_eq!(class(&decls, "Planet").enum_entries, vec!["MERCURY", "VENUS"]);
        assert!(class(&decls, "Empty").enum_entries.is_empty());
        assert!(decls.functions.iter().any(|f| f.name == "describe"));
    }

    #[test]
    fn secondary_constructors_and_implicit_default() {
        let decls = scan(
            "class Point private constructor(val x: Int) {\n    constructor(x: Int, y: Int) : this(x)\n}\nclass Plain\nclass Only {\n    constructor(s: String)\n}\n",
        );
        let point = class(&decls, "Point");
        assert_eq!(point.constructors.len(), 2);
        assert!(point.constructors[0].is_primary);
        assert!(!point.constructors[1].is_primary);
        assert_eq!(param_names(&point.constructors[1].parameters), vec!["x", "y"]);

        let plain = class(&decls, "Plain");
        assert_eq!(plain.constructors.len(), 1);
        assert!(plain.constructors[0].parameters.is_empty());

        let only = class(&decls, "Only");
        assert_eq!(only.constructors.len(), 1);
        assert!(!only.constructors[0].is_primary);
    }

    #[test]
    fn nested_classes_are_qualified_by_outer_name() {
        let decls = scan(
            "class Outer {\n    class Inner(val a: Int)\n    companion object { fun create() = Outer() }\n}\nclass After(val b: Int)\n",
        );
        assert_eq!(class(&decls, "Outer.Inner").simple_name(), "Inner");
        assert_eq!(class(&decls, "After").constructors[0].parameters.len(), 1);
        assert!(!decls.classes.iter().any(|c| c.kind == ClassKind::Object));
    }

    #[test]
    fn functions_and_extensions() {
        let decls = scan(
            "fun foo(a: Int, b: String = \"(\", vararg rest: Int) {}\nfun <T> List<T>.second(fallback: T? = null): T? = null\nfun String?.orBlank(): String = this ?: \"\"\nval x = Foo::class\nval y = object : Runnable { override fun run() {} }\n",
        );
        let foo = &decls.functions[0];
        assert_eq!(foo.name, "foo");
        assert_eq!(foo.receiver, None);
        assert_eq!(param_names(&foo.parameters), vec!["a", "b", "rest"]);
        assert!(foo.parameters[1].has_default);
        assert!(foo.parameters[2].is_vararg);

        let second = &decls.functions[1];
        assert_eq!(second.name, "second");
        assert_eq!(second.receiver.as_deref(), Some("List<T>"));
        assert_eq!(second.parameters[0].type_text, "T?");

        assert_eq!(decls.functions[2].name, "orBlank");
        assert_eq!(decls.functions[2].receiver.as_deref(), Some("String?"));
        assert!(decls.functions.iter().any(|f| f.name == "run"));
        assert!(decls.classes.is_empty());
    }

    #[test]
    fn parameter_annotations_and_function_types() {
        let decls = scan(
            "class Handler(@field:Json(name = \"x\") val id: Long, val onClick: (Int, String?) -> Unit = {}, val check: suspend () -> Boolean)\n",
        );
        let params = &class(&decls, "Handler").constructors[0].parameters;
        assert_eq!(param_names(params), vec!["id", "onClick", "check"]);
        assert_eq!(params[1].type_text, "(Int, String?) -> Unit");
        assert!(params[1].has_default);
        assert_eq!(params[2].type_text, "suspend () -> Boolean");
    }

    #[test]
    fn class_header_without_body_does_not_capture_next_block() {
        let decls = scan("class A(val x: Int)\nfun run() {\n    class Local\n}\n");
        assert_eq!(class(&decls, "Local").name, "Local");
    }

    #[test]
    fn member_functions_know_their_owner() {
        let decls = scan(
            "class Repo {\n    fun find(id: Long) = null\n    companion object { fun create(): Repo = Repo() }\n}\nfun find(name: String) {}\nfun build() {\n    fun local(x: Int) {}\n}\n",
        );
        let owners: Vec<(&str, Option<&str>)> = decls
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f.owner.as_deref()))
            .collect();
        assert_eq!(
            owners,
            vec![
                ("find", Some("Repo")),
                ("create", Some("Repo")),
                ("find", None),
                ("build", None),
                ("local", None),
            ]
        );
    }

    #[test]
    fn defaults_with_nested_syntax_and_comments() {
        let decls = scan(
            "class Config(\n    // the name\n    val name: String = listOf(\"a,b\").joinToString { it },\n    /* limits */ val limits: Map<String, Pair<Int, Int>> = mapOf(\"x\" to (1 to 2)),\n    val check: (String) -> Boolean = { s -> s.length > 2 },\n)\n",
        );
        let params = &class(&decls, "Config").constructors[0].parameters;
        assert_eq!(param_names(params), vec!["name", "limits", "check"]);
        assert!(params.iter().all(|p| p.has_default));
        assert_eq!(params[1].type_text, "Map<String, Pair<Int, Int>>");
        assert!(matches!(
            params[2].type_syntax,
            Some(TypeSyntax::Function { .. })
        ));
    }
}
