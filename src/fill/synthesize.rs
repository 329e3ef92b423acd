//! Value synthesis for a single parameter.
//!
//! Maps a parameter's type classification and the policy's value mode to
//! an expression.  Builtin types get literals (empty or dummy), function
//! types get lambda literals, enums their first constant, objects a
//! reference, and other concrete classes a nested constructor call whose
//! own arguments are planned recursively.  Anything that cannot be
//! synthesized becomes a placeholder (`None`) for the user to fill in.

use crate::fill::dummy::{ValueCorpus, escape_string_literal};
use crate::fill::{filter, plan};
use crate::types::{
    CallCandidate, FillPolicy, Modality, Origin, ParameterDescriptor, TypeClass, TypeRef,
    ValueExpr, ValueMode,
};

/// Constructor lookup for nested construction.
pub trait TypeLookup {
    /// All constructors of the given class, in declaration order.
    fn constructors(&self, type_ref: &TypeRef) -> Vec<CallCandidate>;

    /// Top-level classes declared in `package`.
    fn package_classes(&self, package: &str) -> Vec<TypeRef> {
        let _ = package;
        Vec::new()
    }
}

/// Bounds nested construction.
///
/// A type that is already being expanded further up the current path, or
/// an expansion deeper than `max_depth`, is not constructed again.
#[derive(Debug, Clone)]
pub struct RecursionGuard {
    path: Vec<String>,
    max_depth: usize,
}

impl RecursionGuard {
    pub fn new(max_depth: usize) -> Self {
        Self {
            path: Vec::new(),
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    fn enter(&mut self, type_ref: &TypeRef) -> bool {
        let name = type_ref.qualified_name();
        if self.path.len() >= self.max_depth || self.path.contains(&name) {
            return false;
        }
        self.path.push(name);
        true
    }

    fn leave(&mut self) {
        self.path.pop();
    }
}

pub struct Synthesizer<'a> {
    policy: &'a FillPolicy,
    lookup: &'a dyn TypeLookup,
    corpus: &'a mut dyn ValueCorpus,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        policy: &'a FillPolicy,
        lookup: &'a dyn TypeLookup,
        corpus: &'a mut dyn ValueCorpus,
    ) -> Self {
        Self {
            policy,
            lookup,
            corpus,
        }
    }

    pub fn policy(&self) -> &FillPolicy {
        self.policy
    }

    /// Synthesize a value for `parameter`; `None` means "emit `name =`".
    pub fn synthesize(
        &mut self,
        parameter: &ParameterDescriptor,
        guard: &mut RecursionGuard,
    ) -> Option<ValueExpr> {
        if self.policy.suppress_explicit_value_placeholders {
            return None;
        }
        if self.policy.value_mode == ValueMode::SameNameAsParameter {
            return Some(ValueExpr::Literal(parameter.name.clone()));
        }
        if let Some(value) = self.builtin_value(parameter) {
            return Some(value);
        }

        match &parameter.type_class {
            TypeClass::Object(type_ref) => Some(ValueExpr::Reference {
                type_ref: type_ref.clone(),
                member: None,
            }),
            TypeClass::UserClass(type_ref) if parameter.modality == Modality::Concrete => {
                self.construct(type_ref, guard)
            }
            _ => None,
        }
    }

    /// The decision table for types with a literal representation.
    fn builtin_value(&mut self, parameter: &ParameterDescriptor) -> Option<ValueExpr> {
        let dummy = self.policy.value_mode == ValueMode::DummyValues;
        let non_null = !parameter.is_nullable;
        let literal = |text: &str| Some(ValueExpr::Literal(text.to_string()));

        match &parameter.type_class {
            TypeClass::Boolean if non_null => literal("false"),
            TypeClass::Char if non_null => {
                if dummy {
                    literal(&format!("'{}'", self.corpus.uppercase_letter()))
                } else {
                    literal("''")
                }
            }
            TypeClass::Double if non_null => {
                if dummy {
                    let (whole, fraction) = (self.corpus.next_number(), self.corpus.next_number());
                    literal(&format!("{}.{}", whole, fraction))
                } else {
                    literal("0.0")
                }
            }
            TypeClass::Float if non_null => {
                if dummy {
                    let (whole, fraction) = (self.corpus.next_number(), self.corpus.next_number());
                    literal(&format!("{}.{}f", whole, fraction))
                } else {
                    literal("0.0f")
                }
            }
            TypeClass::Integral if non_null => {
                if dummy {
                    literal(&self.corpus.int_for(&parameter.name).to_string())
                } else {
                    literal("0")
                }
            }
            TypeClass::ArrayLike => literal("arrayOf()"),
            TypeClass::NullableAny => literal("null"),
            TypeClass::CharSequence if non_null => {
                if dummy {
                    let text = self.corpus.string_for(&parameter.name);
                    literal(&format!("\"{}\"", escape_string_literal(&text)))
                } else {
                    literal("\"\"")
                }
            }
            TypeClass::List => literal("listOf()"),
            TypeClass::Set => literal("setOf()"),
            TypeClass::Map => literal("mapOf()"),
            TypeClass::Function { parameters } => Some(lambda_literal(parameters)),
            TypeClass::Enum {
                type_ref,
                first_constant: Some(constant),
            } => Some(ValueExpr::Reference {
                type_ref: type_ref.clone(),
                member: Some(constant.clone()),
            }),
            _ if parameter.is_nullable => literal("null"),
            _ => None,
        }
    }

    fn construct(&mut self, type_ref: &TypeRef, guard: &mut RecursionGuard) -> Option<ValueExpr> {
        let mut constructors: Vec<CallCandidate> = self
            .lookup
            .constructors(type_ref)
            .into_iter()
            .filter(|c| c.origin == Origin::Kotlin)
            .collect();
        constructors.sort_by_key(|c| !c.is_primary);
        let constructor = constructors.into_iter().next()?;

        if !guard.enter(type_ref) {
            tracing::debug!(
                "not expanding {} at depth {}",
                type_ref.qualified_name(),
                guard.depth()
            );
            return None;
        }
        let eligible = filter::eligible_parameters(&constructor, &[], self.policy, false);
        let arguments = plan::build_plan(&eligible, self, guard);
        guard.leave();

        Some(ValueExpr::Construct {
            type_ref: type_ref.clone().nullable(false),
            arguments,
        })
    }
}

/// `{}` for arity 0 and 1, otherwise `{ a: A, b: B -> }`.
fn lambda_literal(parameters: &[TypeRef]) -> ValueExpr {
    if parameters.len() < 2 {
        return ValueExpr::Lambda {
            parameters: Vec::new(),
        };
    }
    let mut taken: Vec<String> = Vec::new();
    let named = parameters
        .iter()
        .map(|ty| {
            let name = suggest_name(ty, &taken);
            taken.push(name.clone());
            (name, ty.clone())
        })
        .collect();
    ValueExpr::Lambda { parameters: named }
}

const KEYWORDS: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while",
];

/// Suggest a lambda parameter name from its type, avoiding `taken`.
///
/// Builtin types get a single letter (`Int` -> `i`), other types their
/// decapitalized name (`UserName` -> `userName`).  Collisions get a
/// numeric suffix.
pub fn suggest_name(type_ref: &TypeRef, taken: &[String]) -> String {
    let simple = type_ref.simple_name();
    let base = if type_ref.package == "kotlin" {
        simple
            .chars()
            .next()
            .map(|c| c.to_ascii_lowercase().to_string())
            .unwrap_or_else(|| "param".to_string())
    } else {
        decapitalize(simple)
    };
    let base = if base.is_empty() || KEYWORDS.contains(&base.as_str()) {
        "param".to_string()
    } else {
        base
    };

    if !taken.contains(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

fn decapitalize(name: &str) -> String {
    // `URL` -> `url`, `URLParser` -> `urlParser`, `User` -> `user`
    let chars: Vec<char> = name.chars().collect();
    let upper_run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let lower_until = match upper_run {
        0 => 0,
        n if n == chars.len() => n,
        1 => 1,
        n => n - 1,
    };
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i < lower_until {
                c.to_ascii_lowercase()
            } else {
                *c
            }
        })
        .collect()
}
