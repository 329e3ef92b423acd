//! Argument synthesis engine.
//!
//! Given a call whose argument list omits some parameters, the engine
//! produces a complete argument list:
//!
//! - [`candidates`] qualifies and ranks the overloads returned by the
//!   analysis collaborator and implements the two-phase choice protocol
//! - [`filter`] decides which parameters still need an argument
//! - [`synthesize`] builds a value for each of them, recursing into
//!   nested constructor calls
//! - [`plan`] collects the values into an [`ArgumentPlan`]
//! - [`format`] applies the plan to the call site text
//! - [`import_edit`] adds the imports shortened references rely on
//!
//! The engine never parses source files itself.  Candidates come from a
//! [`CallAnalysis`] implementation and constructors for nested values
//! from a [`TypeLookup`]; the call site is described by an
//! [`ArgumentListSite`].

pub mod candidates;
pub mod dummy;
pub mod filter;
pub mod format;
pub mod import_edit;
pub mod plan;
pub mod synthesize;

use std::ops::Range;

pub use candidates::{CallAnalysis, Selection};
pub use synthesize::{RecursionGuard, Synthesizer, TypeLookup};

use crate::fill::dummy::ValueCorpus;
use crate::fill::import_edit::ImportScope;
use crate::types::{ArgumentListSite, ArgumentPlan, CallCandidate, Callee, FillPolicy};

/// Reasons a fill produces no edit.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FillError {
    #[error("no candidate has arguments left to fill")]
    NotApplicable,
    #[error("cannot resolve {0}")]
    UnresolvableTarget(String),
    #[error("argument list cannot be edited: {0}")]
    MutationFailure(String),
    #[error("choice {index} is out of range ({available} candidates)")]
    InvalidChoice { index: usize, available: usize },
}

/// A replacement of a byte range of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub range: Range<usize>,
    pub new_text: String,
}

impl TextChange {
    pub fn insert(offset: usize, new_text: impl Into<String>) -> Self {
        Self {
            range: offset..offset,
            new_text: new_text.into(),
        }
    }

    pub fn replace(range: Range<usize>, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Change in document length caused by this change.
    fn delta(&self) -> isize {
        self.new_text.len() as isize - self.range.len() as isize
    }
}

/// The result of a successful fill.
#[derive(Debug, Clone, PartialEq)]
pub struct FillOutcome {
    pub plan: ArgumentPlan,
    /// Non-overlapping changes, sorted by start offset.
    pub changes: Vec<TextChange>,
    /// Cursor stops in the coordinates of the edited document.
    pub cursor_stops: Vec<Range<usize>>,
}

/// Collaborators for one fill.
pub struct FillContext<'a> {
    pub policy: &'a FillPolicy,
    pub lookup: &'a dyn TypeLookup,
    pub corpus: &'a mut dyn ValueCorpus,
    /// Previews and headless runs are not interactive.
    pub interactive: bool,
}

/// Resolve the callee and keep the candidates worth filling.
pub fn propose(
    analysis: &dyn CallAnalysis,
    callee: &Callee,
    site: &ArgumentListSite,
) -> Result<Vec<CallCandidate>, FillError> {
    let resolved = analysis.resolve_candidates(callee);
    if resolved.is_empty() {
        return Err(FillError::UnresolvableTarget(format!("call to `{}`", callee.name)));
    }
    let qualifying = candidates::qualifying_candidates(resolved, site.supplied_argument_count());
    tracing::debug!(
        "{} qualifying candidate(s) for `{}`",
        qualifying.len(),
        callee.name
    );
    if qualifying.is_empty() {
        return Err(FillError::NotApplicable);
    }
    Ok(qualifying)
}

/// Fill the argument list at `site` for the chosen candidate.
pub fn fill(
    source: &str,
    site: &ArgumentListSite,
    candidate: &CallCandidate,
    ctx: FillContext<'_>,
) -> Result<FillOutcome, FillError> {
    check_site(source, site)?;

    let eligible =
        filter::eligible_parameters(candidate, &site.arguments, ctx.policy, site.has_trailing_lambda);
    let mut guard = RecursionGuard::new(ctx.policy.max_nesting_depth);
    let mut synthesizer = Synthesizer::new(ctx.policy, ctx.lookup, ctx.corpus);
    let plan = plan::build_plan(&eligible, &mut synthesizer, &mut guard);
    if plan.is_empty() {
        return Err(FillError::NotApplicable);
    }

    let scope = ImportScope::from_source(source);
    let package_classes = ctx.lookup.package_classes(&scope.package);
    let scope = scope.with_package_classes(package_classes);
    let edit = format::format_arguments(site, &plan, ctx.policy, &scope, ctx.interactive);

    let mut changes = scope.import_changes(&edit.imports);
    let shift: isize = changes
        .iter()
        .filter(|c| c.range.start <= edit.range.start)
        .map(TextChange::delta)
        .sum();
    let base = (edit.range.start as isize + shift).max(0) as usize;
    let cursor_stops = edit
        .cursor_stops
        .iter()
        .map(|r| base + r.start..base + r.end)
        .collect();

    changes.push(TextChange::replace(edit.range, edit.new_text));
    changes.sort_by_key(|c| c.range.start);

    Ok(FillOutcome {
        plan,
        changes,
        cursor_stops,
    })
}

/// The site must still describe a parenthesized list of `source`.
fn check_site(source: &str, site: &ArgumentListSite) -> Result<(), FillError> {
    let bytes = source.as_bytes();
    let valid = site.open_paren < site.close_paren
        && bytes.get(site.open_paren) == Some(&b'(')
        && bytes.get(site.close_paren) == Some(&b')')
        && site
            .arguments
            .iter()
            .all(|a| a.span.start > site.open_paren && a.span.end <= site.close_paren);
    if valid {
        Ok(())
    } else {
        Err(FillError::MutationFailure(format!(
            "no argument list at {}..{}",
            site.open_paren, site.close_paren
        )))
    }
}
