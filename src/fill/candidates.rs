//! Candidate resolution and overload disambiguation.
//!
//! The analysis collaborator may return several overloads for one call
//! site (e.g. a class with a primary and a secondary constructor, or an
//! unresolved call with multiple same-named functions).  This module
//! decides which of them are worth filling and implements the two-phase
//! choice protocol: [`select`] either picks a candidate outright or asks
//! the caller to let the user choose, and [`resume`] continues with the
//! chosen index.

use crate::fill::FillError;
use crate::types::{CallCandidate, Callee, Origin, ValueMode};

/// The analysis collaborator: resolves a callee to its overloads.
pub trait CallAnalysis {
    fn resolve_candidates(&self, callee: &Callee) -> Vec<CallCandidate>;
}

/// Outcome of the first phase of candidate selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'a> {
    /// Exactly one candidate applies (or the render is non-interactive).
    Chosen(&'a CallCandidate),
    /// The user has to pick one of these labels; continue with [`resume`].
    Choose(Vec<String>),
}

/// Keep the candidates that still have something to fill, ordered by
/// ascending parameter count.
///
/// A candidate qualifies when it has more non-vararg parameters than
/// arguments already supplied and it is not a foreign member.
pub fn qualifying_candidates(
    candidates: Vec<CallCandidate>,
    supplied_arguments: usize,
) -> Vec<CallCandidate> {
    let mut qualifying: Vec<CallCandidate> = candidates
        .into_iter()
        .filter(|c| c.origin != Origin::Foreign && c.fixed_arity() > supplied_arguments)
        .collect();
    // Stable, so equal-sized overloads keep their declaration order.
    qualifying.sort_by_key(|c| c.parameters.len());
    qualifying
}

/// First phase: pick a candidate or ask for a choice.
///
/// Non-interactive renders (previews, the CLI) always use the first
/// candidate without prompting.
pub fn select(candidates: &[CallCandidate], interactive: bool) -> Result<Selection<'_>, FillError> {
    match candidates {
        [] => Err(FillError::NotApplicable),
        [only] => Ok(Selection::Chosen(only)),
        [first, ..] if !interactive => Ok(Selection::Chosen(first)),
        many => Ok(Selection::Choose(many.iter().map(CallCandidate::label).collect())),
    }
}

/// Second phase: continue with the candidate the user picked.
pub fn resume(candidates: &[CallCandidate], index: usize) -> Result<&CallCandidate, FillError> {
    candidates.get(index).ok_or(FillError::InvalidChoice {
        index,
        available: candidates.len(),
    })
}

/// Title of the quick fix offered for the given candidates.
pub fn action_title(candidates: &[CallCandidate], mode: ValueMode) -> String {
    let constructor = candidates.iter().any(|c| c.is_constructor);
    match (mode, constructor) {
        (ValueMode::EmptyDefaults, true) => "Fill class constructor".to_string(),
        (ValueMode::EmptyDefaults, false) => "Fill function".to_string(),
        (ValueMode::DummyValues, true) => "Fill class constructor with dummy values".to_string(),
        (ValueMode::DummyValues, false) => "Fill function with dummy values".to_string(),
        (ValueMode::SameNameAsParameter, _) => {
            "Fill class constructor with variables of the same name".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParameterDescriptor, TypeClass};

    fn candidate(name: &str, params: &[&str], is_constructor: bool) -> CallCandidate {
        CallCandidate {
            name: name.to_string(),
            parameters: params
                .iter()
                .map(|p| ParameterDescriptor::new(*p, "Int", TypeClass::Integral))
                .collect(),
            is_constructor,
            is_primary: false,
            origin: Origin::Kotlin,
        }
    }

    #[test]
    fn excludes_fully_supplied_candidates() {
        let result = qualifying_candidates(vec![candidate("foo", &["a", "b"], false)], 2);
        assert!(result.is_empty());
    }

    #[test]
    fn vararg_does_not_count_towards_arity() {
        let mut c = candidate("bar", &["s"], false);
        c.parameters[0].is_vararg = true;
        assert!(qualifying_candidates(vec![c], 0).is_empty());
    }

    #[test]
    fn excludes_foreign_candidates() {
        let mut c = candidate("Java", &["str"], true);
        c.origin = Origin::Foreign;
        assert!(qualifying_candidates(vec![c], 0).is_empty());
    }

    #[test]
    fn sorts_by_parameter_count_stably() {
        let result = qualifying_candidates(
            vec![
                candidate("foo", &["a", "b", "c"], false),
                candidate("foo", &["x", "y"], false),
                candidate("foo", &["p", "q"], false),
            ],
            0,
        );
        let labels: Vec<String> = result.iter().map(CallCandidate::label).collect();
        assert_eq!(
            labels,
            vec![
                "foo(x: Int, y: Int)",
                "foo(p: Int, q: Int)",
                "foo(a: Int, b: Int, c: Int)"
            ]
        );
    }

    #[test]
    fn single_candidate_is_auto_selected() {
        let candidates = vec![candidate("foo", &["a"], false)];
        assert_eq!(
            select(&candidates, true).unwrap(),
            Selection::Chosen(&candidates[0])
        );
    }

    #[test]
    fn ambiguous_interactive_asks_for_choice() {
        let candidates = vec![
            candidate("foo", &["a"], false),
            candidate("foo", &["a", "b"], false),
        ];
        match select(&candidates, true).unwrap() {
            Selection::Choose(labels) => assert_eq!(labels.len(), 2),
            other => panic!("expected a choice, got {:?}", other),
        }
        assert_eq!(resume(&candidates, 1).unwrap().parameters.len(), 2);
    }

    #[test]
    fn preview_uses_first_candidate() {
        let candidates = vec![
            candidate("foo", &["a"], false),
            candidate("foo", &["a", "b"], false),
        ];
        assert_eq!(
            select(&candidates, false).unwrap(),
            Selection::Chosen(&candidates[0])
        );
    }

    #[test]
    fn empty_is_not_applicable() {
        assert!(matches!(select(&[], true), Err(FillError::NotApplicable)));
    }

    #[test]
    fn out_of_range_choice_is_rejected() {
        let candidates = vec![candidate("foo", &["a"], false)];
        assert!(matches!(
            resume(&candidates, 3),
            Err(FillError::InvalidChoice { index: 3, available: 1 })
        ));
    }

    #[test]
    fn titles_follow_mode_and_kind() {
        let ctor = vec![candidate("User", &["a"], true)];
        let func = vec![candidate("foo", &["a"], false)];
        assert_eq!(action_title(&ctor, ValueMode::EmptyDefaults), "Fill class constructor");
        assert_eq!(action_title(&func, ValueMode::EmptyDefaults), "Fill function");
        assert_eq!(
            action_title(&func, ValueMode::DummyValues),
            "Fill function with dummy values"
        );
        assert_eq!(
            action_title(&func, ValueMode::SameNameAsParameter),
            "Fill class constructor with variables of the same name"
        );
    }
}
