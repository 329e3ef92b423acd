//! Data types used throughout the FillClass server.
//!
//! This module contains the "model" structs and enums shared by the
//! argument synthesis engine (`fill`), the Kotlin declaration index
//! (`kotlin`) and the LSP host: resolved call candidates and their
//! parameters, the fill policy, the argument plan produced by the engine,
//! and the textual view of an argument list at a call site.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// How the value of each synthesized argument is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    /// Type-appropriate empty literals (`""`, `0`, `listOf()`, ...).
    EmptyDefaults,
    /// Plausible random literals guessed from the parameter name.
    DummyValues,
    /// A reference to a variable with the same name as the parameter.
    SameNameAsParameter,
}

/// Whether a class can be instantiated through one of its constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modality {
    #[default]
    Concrete,
    Abstract,
    Sealed,
}

/// Where a candidate was declared.
///
/// Foreign members (Java sources) are never filled because their default
/// values and parameter names cannot be re-synthesized reliably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    #[default]
    Kotlin,
    Foreign,
}

/// A reference to a declared type.
///
/// `name` is the name relative to its package and may contain dots for
/// nested classes (e.g. `Outer.Inner`).  Builtin Kotlin types live in the
/// `kotlin` package; types that could not be located have an empty package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub package: String,
    pub name: String,
    pub nullable: bool,
}

impl TypeRef {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            nullable: false,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// The fully-qualified name, e.g. `"com.example.User"`.
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// The last segment of the name (`"Inner"` for `Outer.Inner`).
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The top-level class that has to be imported to refer to this type
    /// by its short name (`"com.example.Outer"` for `Outer.Inner`).
    pub fn importable_name(&self) -> Option<String> {
        if self.package.is_empty() {
            return None;
        }
        let top = self.name.split('.').next().unwrap_or(&self.name);
        Some(format!("{}.{}", self.package, top))
    }
}

/// Tagged classification of a parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeClass {
    Boolean,
    Char,
    Double,
    Float,
    /// `Int`, `Long` and `Short`.
    Integral,
    /// Arrays and general collections.
    ArrayLike,
    /// Exactly `Any?`.
    NullableAny,
    /// `String` or `CharSequence`.
    CharSequence,
    List,
    Set,
    Map,
    /// A function type; `parameters` excludes the return type.
    Function { parameters: Vec<TypeRef> },
    /// An enum class and the name of its first declared constant, if known.
    Enum {
        type_ref: TypeRef,
        first_constant: Option<String>,
    },
    /// A singleton `object`.
    Object(TypeRef),
    /// Any other class declared in source.
    UserClass(TypeRef),
    /// A type that could not be classified.
    Other,
}

/// One formal parameter of a candidate signature.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    /// The declared type as written in source (e.g. `"List<String>?"`).
    pub type_text: String,
    pub type_class: TypeClass,
    pub is_vararg: bool,
    pub has_default_value: bool,
    pub is_nullable: bool,
    /// Only meaningful for [`TypeClass::UserClass`].
    pub modality: Modality,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, type_text: impl Into<String>, type_class: TypeClass) -> Self {
        let type_text = type_text.into();
        Self {
            name: name.into(),
            is_nullable: type_text.trim_end().ends_with('?'),
            type_text,
            type_class,
            is_vararg: false,
            has_default_value: false,
            modality: Modality::Concrete,
        }
    }

    pub fn is_function_type(&self) -> bool {
        matches!(self.type_class, TypeClass::Function { .. })
    }
}

/// One resolvable target of a call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CallCandidate {
    /// The function name, or the class name for constructors.
    pub name: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub is_constructor: bool,
    /// Whether this is the primary constructor of its class.
    pub is_primary: bool,
    pub origin: Origin,
}

impl CallCandidate {
    /// Human-readable signature used to disambiguate overloads,
    /// e.g. `"User(name: String, age: Int)"`.
    pub fn label(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| {
                if p.is_vararg {
                    format!("vararg {}: {}", p.name, p.type_text)
                } else {
                    format!("{}: {}", p.name, p.type_text)
                }
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }

    /// Number of parameters that can be supplied one argument each.
    pub fn fixed_arity(&self) -> usize {
        self.parameters.iter().filter(|p| !p.is_vararg).count()
    }
}

/// User-configurable synthesis policy, immutable per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillPolicy {
    pub value_mode: ValueMode,
    pub skip_defaulted_parameters: bool,
    /// Emit `name =` placeholders instead of literal values.
    pub suppress_explicit_value_placeholders: bool,
    pub append_trailing_comma: bool,
    pub one_argument_per_line: bool,
    pub place_cursor_at_each_argument: bool,
    /// Bound for nested constructor synthesis.
    pub max_nesting_depth: usize,
}

impl Default for FillPolicy {
    fn default() -> Self {
        Self {
            value_mode: ValueMode::EmptyDefaults,
            skip_defaulted_parameters: false,
            suppress_explicit_value_placeholders: false,
            append_trailing_comma: false,
            one_argument_per_line: false,
            place_cursor_at_each_argument: true,
            max_nesting_depth: 8,
        }
    }
}

/// A synthesized argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// A literal or bare expression (`0`, `""`, `name`).
    Literal(String),
    /// A reference to an object or to a member of a type (enum constant).
    Reference {
        type_ref: TypeRef,
        member: Option<String>,
    },
    /// A nested constructor call with its own planned arguments.
    Construct {
        type_ref: TypeRef,
        arguments: ArgumentPlan,
    },
    /// A lambda literal; parameters are only spelled out for arity > 1.
    Lambda { parameters: Vec<(String, TypeRef)> },
}

/// Renders the fully-qualified, single-line form of the value.
impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExpr::Literal(text) => f.write_str(text),
            ValueExpr::Reference { type_ref, member } => match member {
                Some(member) => write!(f, "{}.{}", type_ref.qualified_name(), member),
                None => f.write_str(&type_ref.qualified_name()),
            },
            ValueExpr::Construct {
                type_ref,
                arguments,
            } => write!(f, "{}({})", type_ref.qualified_name(), arguments),
            ValueExpr::Lambda { parameters } => {
                if parameters.is_empty() {
                    return f.write_str("{}");
                }
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(name, ty)| {
                        let nullable = if ty.nullable { "?" } else { "" };
                        format!("{}: {}{}", name, ty.qualified_name(), nullable)
                    })
                    .collect();
                write!(f, "{{ {} -> }}", params.join(", "))
            }
        }
    }
}

/// One entry of an [`ArgumentPlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedArgument {
    pub parameter_name: String,
    /// `None` denotes a placeholder argument (`name =`).
    pub value: Option<ValueExpr>,
}

/// The engine's pure output: arguments to add, in parameter order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgumentPlan {
    pub arguments: Vec<PlannedArgument>,
}

impl ArgumentPlan {
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.arguments
            .iter()
            .map(|a| a.parameter_name.as_str())
            .collect()
    }
}

impl fmt::Display for ArgumentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &arg.value {
                Some(value) => write!(f, "{} = {}", arg.parameter_name, value)?,
                None => write!(f, "{} =", arg.parameter_name)?,
            }
        }
        Ok(())
    }
}

/// The callee of a call expression as written at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callee {
    /// Simple name of the called function or class (`"foo"`, `"User"`).
    pub name: String,
    /// Receiver or package qualifier before the name, if any
    /// (`"Foo()"` in `Foo().foo(`, `"com.example"` in `com.example.User(`).
    pub qualifier: Option<String>,
}

/// An argument already present in the argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingArgument {
    /// The argument name when written as `name = value`.
    pub name: Option<String>,
    /// The argument text, trimmed of surrounding whitespace.
    pub text: String,
    /// Byte range of `text` in the document.
    pub span: Range<usize>,
    pub comments: ArgumentComments,
}

/// Comments next to an existing argument, each kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentComments {
    /// On the lines before the argument.
    pub leading: Vec<String>,
    /// Between the argument and its comma.
    pub inline: Vec<String>,
    /// After the comma, on the same line.
    pub trailing: Vec<String>,
}

impl ExistingArgument {
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}

/// Textual view of the argument list of a call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentListSite {
    /// Byte offset of `(`.
    pub open_paren: usize,
    /// Byte offset of the matching `)`.
    pub close_paren: usize,
    pub arguments: Vec<ExistingArgument>,
    /// Byte offset just past the last top-level comma when the list already
    /// ends with a trailing comma.
    pub trailing_comma_end: Option<usize>,
    /// Whether a lambda follows the closing parenthesis.
    pub has_trailing_lambda: bool,
    /// Leading whitespace of the line that contains `(`.
    pub line_indent: String,
    /// Comments that belong to no argument: every comment of an empty
    /// list, else those on their own lines after the last argument.
    pub dangling_comments: Vec<String>,
}

impl ArgumentListSite {
    pub fn has_trailing_comma(&self) -> bool {
        self.trailing_comma_end.is_some()
    }

    /// Number of arguments supplied at the call site, counting a trailing
    /// lambda as one.
    pub fn supplied_argument_count(&self) -> usize {
        self.arguments.len() + usize::from(self.has_trailing_lambda)
    }
}
