//! Parsing and classification of Kotlin type text.
//!
//! [`from_node`] reads a type node of the Kotlin syntax tree into a small
//! [`TypeSyntax`] and [`classify`] maps it onto a [`TypeClass`], resolving
//! user-defined names through a caller-provided [`TypeResolver`].

use tree_sitter::Node;

use crate::kotlin::declarations;
use crate::kotlin::syntax::{self, Grammar};
use crate::types::{Modality, TypeClass, TypeRef};

/// A parsed type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSyntax {
    /// `a.b.Name<Args>?`
    Named {
        path: String,
        arguments: Vec<TypeSyntax>,
        nullable: bool,
    },
    /// `(A, B) -> R`, optionally with a receiver, `suspend` or `?`.
    Function {
        parameters: Vec<TypeSyntax>,
        nullable: bool,
    },
}

impl TypeSyntax {
    pub fn is_nullable(&self) -> bool {
        match self {
            TypeSyntax::Named { nullable, .. } | TypeSyntax::Function { nullable, .. } => *nullable,
        }
    }

    pub(crate) fn set_nullable(&mut self) {
        match self {
            TypeSyntax::Named { nullable, .. } | TypeSyntax::Function { nullable, .. } => {
                *nullable = true
            }
        }
    }
}

/// Parse type text; `None` for malformed input.
pub fn parse(text: &str) -> Option<TypeSyntax> {
    let source = format!("fun f(p: {}) {{}}\n", text);
    let tree = syntax::parse(&source, Grammar::Kotlin)?;
    if tree.root_node().has_error() {
        return None;
    }
    declarations::scan(&source)
        .functions
        .into_iter()
        .next()?
        .parameters
        .into_iter()
        .next()?
        .type_syntax
}

/// Build the syntax of a Kotlin type node (`user_type`, `nullable_type`,
/// `function_type`, ...).
pub fn from_node(node: Node<'_>, source: &str) -> Option<TypeSyntax> {
    match node.kind() {
        "nullable_type" => {
            let mut ty = from_node(type_child(node)?, source)?;
            ty.set_nullable();
            Some(ty)
        }
        "function_type" => {
            let list = syntax::child_of_kind(node, &["function_type_parameters"])?;
            let parameters = syntax::children(list)
                .into_iter()
                .filter(|p| p.is_named() && !skipped(*p))
                .map(|p| match p.kind() {
                    // `(index: Int) -> Unit`
                    "parameter" | "function_type_parameter" => {
                        type_child(p).and_then(|t| from_node(t, source))
                    }
                    _ => from_node(p, source),
                })
                .collect::<Option<Vec<_>>>()?;
            Some(TypeSyntax::Function {
                parameters,
                nullable: false,
            })
        }
        "user_type" => {
            let mut segments = Vec::new();
            let mut arguments = Vec::new();
            let mut parts = Vec::new();
            for child in syntax::children(node) {
                if child.kind() == "simple_user_type" {
                    parts.extend(syntax::children(child));
                } else {
                    parts.push(child);
                }
            }
            for part in parts {
                if syntax::is_identifier(part) {
                    segments.push(syntax::identifier_text(part, source));
                } else if part.kind() == "type_arguments" {
                    arguments = type_arguments(part, source)?;
                }
            }
            if segments.is_empty() {
                return None;
            }
            Some(TypeSyntax::Named {
                path: segments.join("."),
                arguments,
                nullable: false,
            })
        }
        _ if syntax::is_identifier(node) || node.kind() == "dynamic" => Some(TypeSyntax::Named {
            path: syntax::identifier_text(node, source),
            arguments: Vec::new(),
            nullable: false,
        }),
        // `(T)`, `type`, `not_nullable_type` and other single-type wrappers
        _ => from_node(type_child(node)?, source),
    }
}

/// `<A, out B, *>`
fn type_arguments(node: Node<'_>, source: &str) -> Option<Vec<TypeSyntax>> {
    syntax::children(node)
        .into_iter()
        .filter(|a| a.is_named() && !syntax::is_comment(*a))
        .map(|argument| {
            if argument.kind() == "type_projection"
                && syntax::children(argument).iter().any(|c| c.kind() == "*")
            {
                return Some(TypeSyntax::Named {
                    path: "Any".to_string(),
                    arguments: Vec::new(),
                    nullable: true,
                });
            }
            if argument.kind() == "type_projection" {
                return from_node(type_child(argument)?, source);
            }
            from_node(argument, source)
        })
        .collect()
}

/// Modifiers, annotations and comments around a type.
fn skipped(node: Node<'_>) -> bool {
    let kind = node.kind();
    syntax::is_comment(node)
        || kind.ends_with("modifiers")
        || kind.ends_with("modifier")
        || kind.contains("annotation")
}

/// The single type inside a wrapper node.
fn type_child(node: Node<'_>) -> Option<Node<'_>> {
    syntax::children(node)
        .into_iter()
        .find(|c| c.is_named() && !skipped(*c))
}

/// What a user-defined type name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    Class { type_ref: TypeRef, modality: Modality },
    Interface(TypeRef),
    Enum { type_ref: TypeRef, first_entry: Option<String> },
    Object(TypeRef),
}

impl ResolvedType {
    fn type_ref(&self) -> &TypeRef {
        match self {
            ResolvedType::Class { type_ref, .. }
            | ResolvedType::Interface(type_ref)
            | ResolvedType::Enum { type_ref, .. }
            | ResolvedType::Object(type_ref) => type_ref,
        }
    }
}

/// Classification result: the type class and, for classes, their modality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub type_class: TypeClass,
    pub modality: Modality,
}

fn builtin(name: &str) -> Option<TypeClass> {
    Some(match name {
        "Boolean" => TypeClass::Boolean,
        "Char" => TypeClass::Char,
        "Double" => TypeClass::Double,
        "Float" => TypeClass::Float,
        "Int" | "Long" | "Short" => TypeClass::Integral,
        "Array" | "Collection" | "MutableCollection" | "Iterable" | "MutableIterable" => {
            TypeClass::ArrayLike
        }
        "String" | "CharSequence" => TypeClass::CharSequence,
        "List" | "MutableList" => TypeClass::List,
        "Set" | "MutableSet" => TypeClass::Set,
        "Map" | "MutableMap" => TypeClass::Map,
        _ => return None,
    })
}

/// Builtin names that live in the default-imported packages.
const KOTLIN_NAMES: &[&str] = &[
    "Any", "Unit", "Nothing", "Boolean", "Char", "Double", "Float", "Int", "Long", "Short",
    "Byte", "String", "CharSequence", "Number", "Array", "Comparable", "Throwable",
    "IntArray", "LongArray", "ShortArray", "ByteArray", "CharArray", "BooleanArray",
    "DoubleArray", "FloatArray", "UInt", "ULong", "UShort", "UByte",
];

const COLLECTION_NAMES: &[&str] = &[
    "Collection", "MutableCollection", "Iterable", "MutableIterable", "List", "MutableList",
    "Set", "MutableSet", "Map", "MutableMap", "ArrayList", "HashMap", "HashSet",
    "LinkedHashMap", "LinkedHashSet",
];

/// Name lookup for the file a type is written in.
pub trait TypeResolver {
    /// Resolve a written path (`"User"`, `"com.example.User"`,
    /// `"Outer.Inner"`), falling back to any indexed package.
    fn resolve(&self, path: &str) -> Option<ResolvedType>;

    /// A simple name the file sees without qualification: its own
    /// declarations, its package and its imports.
    fn visible(&self, name: &str) -> Option<ResolvedType>;
}

fn user_type(resolved: Option<ResolvedType>) -> Classified {
    let concrete = |type_class| Classified {
        type_class,
        modality: Modality::Concrete,
    };
    match resolved {
        Some(ResolvedType::Class { type_ref, modality }) => Classified {
            type_class: TypeClass::UserClass(type_ref),
            modality,
        },
        Some(ResolvedType::Interface(type_ref)) => Classified {
            type_class: TypeClass::UserClass(type_ref),
            modality: Modality::Abstract,
        },
        Some(ResolvedType::Enum {
            type_ref,
            first_entry,
        }) => concrete(TypeClass::Enum {
            type_ref,
            first_constant: first_entry,
        }),
        Some(ResolvedType::Object(type_ref)) => concrete(TypeClass::Object(type_ref)),
        None => concrete(TypeClass::Other),
    }
}

/// Classify a type.  A user declaration visible under a builtin's simple
/// name wins over the builtin.
pub fn classify(ty: &TypeSyntax, resolver: &dyn TypeResolver) -> Classified {
    let concrete = |type_class| Classified {
        type_class,
        modality: Modality::Concrete,
    };

    match ty {
        TypeSyntax::Function { parameters, .. } => concrete(TypeClass::Function {
            parameters: parameters.iter().map(|p| type_ref(p, resolver)).collect(),
        }),
        TypeSyntax::Named { path, nullable, .. } => {
            let simple = path.rsplit('.').next().unwrap_or(path);
            if path == simple
                && let Some(resolved) = resolver.visible(simple)
            {
                return user_type(Some(resolved));
            }
            let qualified_builtin = path == simple || path.starts_with("kotlin.");
            if qualified_builtin && simple == "Any" && *nullable {
                return concrete(TypeClass::NullableAny);
            }
            if qualified_builtin && let Some(class) = builtin(simple) {
                return concrete(class);
            }
            user_type(resolver.resolve(path))
        }
    }
}

/// The qualified reference for a type, as used in lambda parameter lists.
pub fn type_ref(ty: &TypeSyntax, resolver: &dyn TypeResolver) -> TypeRef {
    let nullable = ty.is_nullable();
    match ty {
        TypeSyntax::Named { path, .. } => {
            let simple = path.rsplit('.').next().unwrap_or(path);
            if path == simple
                && let Some(resolved) = resolver.visible(simple)
            {
                return resolved.type_ref().clone().nullable(nullable);
            }
            if path == simple && KOTLIN_NAMES.contains(&simple) {
                return TypeRef::new("kotlin", simple).nullable(nullable);
            }
            if path == simple && COLLECTION_NAMES.contains(&simple) {
                return TypeRef::new("kotlin.collections", simple).nullable(nullable);
            }
            match resolver.resolve(path) {
                Some(resolved) => resolved.type_ref().clone().nullable(nullable),
                None => TypeRef::new("", path.as_str()).nullable(nullable),
            }
        }
        // Function-typed lambda parameters are rare; keep them unqualified.
        TypeSyntax::Function { .. } => TypeRef::new("", "Function").nullable(nullable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Declarations of `com.example`; `visible` names shadow builtins.
    struct Example {
        visible: &'static [&'static str],
    }

    impl TypeResolver for Example {
        fn resolve(&self, path: &str) -> Option<ResolvedType> {
            let type_ref = |name: &str| TypeRef::new("com.example", name);
            match path.rsplit('.').next().unwrap_or(path) {
                "User" => Some(ResolvedType::Class {
                    type_ref: type_ref("User"),
                    modality: Modality::Concrete,
                }),
                "Shape" => Some(ResolvedType::Class {
                    type_ref: type_ref("Shape"),
                    modality: Modality::Sealed,
                }),
                "Repo" => Some(ResolvedType::Interface(type_ref("Repo"))),
                "Color" => Some(ResolvedType::Enum {
                    type_ref: type_ref("Color"),
                    first_entry: Some("RED".to_string()),
                }),
                "Registry" => Some(ResolvedType::Object(type_ref("Registry"))),
                "List" | "String" => Some(ResolvedType::Class {
                    type_ref: type_ref(path),
                    modality: Modality::Concrete,
                }),
                _ => None,
            }
        }

        fn visible(&self, name: &str) -> Option<ResolvedType> {
            if self.visible.contains(&name) {
                self.resolve(name)
            } else {
                None
            }
        }
    }

    const EXAMPLE: Example = Example { visible: &[] };

    fn class_of(text: &str) -> TypeClass {
        let ty = parse(text).unwrap_or_else(|| panic!("cannot parse {}", text));
        classify(&ty, &EXAMPLE).type_class
    }

    #[test]
    fn parses_named_types() {
        assert_eq!(
            parse("Map<String, List<Int>>?"),
            Some(TypeSyntax::Named {
                path: "Map".to_string(),
                arguments: vec![
                    TypeSyntax::Named {
                        path: "String".to_string(),
                        arguments: vec![],
                        nullable: false,
                    },
                    TypeSyntax::Named {
                        path: "List".to_string(),
                        arguments: vec![TypeSyntax::Named {
                            path: "Int".to_string(),
                            arguments: vec![],
                            nullable: false,
                        }],
                        nullable: false,
                    },
                ],
                nullable: true,
            })
        );
        assert!(parse("com.example.Outer.Inner").is_some());
        assert!(parse("List<out Number>").is_some());
        assert!(parse("Array<*>").is_some());
        assert_eq!(parse("List<"), None);
    }

    #[test]
    fn parses_function_types() {
        for text in [
            "() -> Unit",
            "(Int, String?) -> Boolean",
            "suspend (Int) -> Unit",
            "((Int) -> Unit)?",
            "String.(Int) -> Unit",
            "(index: Int, value: String) -> Unit",
            "(Int) -> (String) -> Unit",
        ] {
            let ty = parse(text).unwrap_or_else(|| panic!("cannot parse {}", text));
            assert!(matches!(ty, TypeSyntax::Function { .. }), "{}", text);
        }
        assert!(parse("((Int) -> Unit)?").is_some_and(|t| t.is_nullable()));
    }

    #[test]
    fn classifies_builtins() {
        assert_eq!(class_of("Boolean"), TypeClass::Boolean);
        assert_eq!(class_of("Char"), TypeClass::Char);
        assert_eq!(class_of("Double"), TypeClass::Double);
        assert_eq!(class_of("Float"), TypeClass::Float);
        for integral in ["Int", "Long", "Short", "kotlin.Int"] {
            assert_eq!(class_of(integral), TypeClass::Integral);
        }
        assert_eq!(class_of("Byte"), TypeClass::Other);
        assert_eq!(class_of("Array<String>"), TypeClass::ArrayLike);
        assert_eq!(class_of("Collection<Int>"), TypeClass::ArrayLike);
        assert_eq!(class_of("Any?"), TypeClass::NullableAny);
        assert_eq!(class_of("Any"), TypeClass::Other);
        assert_eq!(class_of("String"), TypeClass::CharSequence);
        assert_eq!(class_of("CharSequence?"), TypeClass::CharSequence);
        assert_eq!(class_of("MutableList<Int>"), TypeClass::List);
        assert_eq!(class_of("Set<Int>"), TypeClass::Set);
        assert_eq!(class_of("Map<Int, Int>"), TypeClass::Map);
        assert_eq!(class_of("IntArray"), TypeClass::Other);
    }

    #[test]
    fn classifies_function_parameters() {
        assert_eq!(
            class_of("(Int, String?, User) -> String"),
            TypeClass::Function {
                parameters: vec![
                    TypeRef::new("kotlin", "Int"),
                    TypeRef::new("kotlin", "String").nullable(true),
                    TypeRef::new("com.example", "User"),
                ],
            }
        );
    }

    #[test]
    fn classifies_user_types() {
        assert_eq!(
            class_of("User"),
            TypeClass::UserClass(TypeRef::new("com.example", "User"))
        );
        let sealed = classify(&parse("Shape").unwrap_or_else(|| panic!()), &EXAMPLE);
        assert_eq!(sealed.modality, Modality::Sealed);
        let interface = classify(&parse("Repo").unwrap_or_else(|| panic!()), &EXAMPLE);
        assert_eq!(interface.modality, Modality::Abstract);
        assert_eq!(
            class_of("Color"),
            TypeClass::Enum {
                type_ref: TypeRef::new("com.example", "Color"),
                first_constant: Some("RED".to_string()),
            }
        );
        assert_eq!(
            class_of("Registry"),
            TypeClass::Object(TypeRef::new("com.example", "Registry"))
        );
        assert_eq!(class_of("Runnable"), TypeClass::Other);
    }

    #[test]
    fn visible_user_classes_shadow_builtins() {
        let shadowing = Example {
            visible: &["List", "String"],
        };
        let list = parse("List<Int>").unwrap_or_else(|| panic!());
        assert_eq!(
            classify(&list, &shadowing).type_class,
            TypeClass::UserClass(TypeRef::new("com.example", "List"))
        );
        assert_eq!(
            type_ref(&parse("String?").unwrap_or_else(|| panic!()), &shadowing),
            TypeRef::new("com.example", "String").nullable(true)
        );
        // Qualified builtins and names nobody shadows stay builtin.
        let qualified = parse("kotlin.collections.List<Int>").unwrap_or_else(|| panic!());
        assert_eq!(classify(&qualified, &shadowing).type_class, TypeClass::List);
        assert_eq!(class_of("List<Int>"), TypeClass::List);
    }
}
