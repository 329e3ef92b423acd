//! The fill quick fix at a document position.
//!
//! Ties the pieces together for one request: locate the call under the
//! cursor, view the declaration index from the current file, propose
//! candidates and run the engine with the configured policy.  Used by
//! both the LSP handlers and the `fill` CLI command.

use crate::config::FillConfig;
use crate::fill::dummy::LoremCorpus;
use crate::fill::import_edit::ImportScope;
use crate::fill::{self, FillContext, FillError, FillOutcome, Selection, candidates};
use crate::kotlin::{DeclarationIndex, call_site};
use crate::types::{ArgumentListSite, CallCandidate, Callee, ValueMode};

/// The call at a position and the candidates worth filling.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub callee: Callee,
    pub site: ArgumentListSite,
    pub candidates: Vec<CallCandidate>,
}

impl Proposal {
    /// First phase of the choice protocol, always interactive here.
    pub fn selection(&self) -> Result<Selection<'_>, FillError> {
        candidates::select(&self.candidates, true)
    }

    pub fn title(&self, mode: ValueMode) -> String {
        candidates::action_title(&self.candidates, mode)
    }
}

/// One fill to perform.
#[derive(Debug, Clone)]
pub struct FillRequest {
    pub offset: usize,
    pub mode: ValueMode,
    /// Index into the proposed candidates; the first one when `None`.
    pub choice: Option<usize>,
    /// Label of the chosen candidate when the action was offered.  A
    /// different label at resolve time means the document changed.
    pub expected_label: Option<String>,
    pub interactive: bool,
}

pub fn propose_at(
    index: &DeclarationIndex,
    source: &str,
    offset: usize,
) -> Result<Proposal, FillError> {
    let (callee, site) = call_site::locate(source, offset)
        .ok_or_else(|| FillError::UnresolvableTarget("the call at the cursor".to_string()))?;
    let analysis = index.scoped(ImportScope::from_source(source));
    let candidates = fill::propose(&analysis, &callee, &site)?;
    Ok(Proposal {
        callee,
        site,
        candidates,
    })
}

pub fn fill_at(
    index: &DeclarationIndex,
    source: &str,
    config: &FillConfig,
    request: &FillRequest,
) -> Result<FillOutcome, FillError> {
    let proposal = propose_at(index, source, request.offset)?;
    let candidate = match request.choice {
        Some(choice) => candidates::resume(&proposal.candidates, choice)?,
        None => match candidates::select(&proposal.candidates, false)? {
            Selection::Chosen(candidate) => candidate,
            Selection::Choose(_) => candidates::resume(&proposal.candidates, 0)?,
        },
    };
    if let Some(expected) = &request.expected_label
        && candidate.label() != *expected
    {
        return Err(FillError::MutationFailure(format!(
            "`{}` is now `{}`",
            expected,
            candidate.label()
        )));
    }

    let policy = config.policy(request.mode);
    let lookup = index.scoped(ImportScope::from_source(source));
    let mut corpus = match config.dummy_seed {
        Some(seed) => LoremCorpus::seeded(seed),
        None => LoremCorpus::new(),
    };
    tracing::debug!("filling {} with {:?}", candidate.label(), request.mode);
    fill::fill(
        source,
        &proposal.site,
        candidate,
        FillContext {
            policy: &policy,
            lookup: &lookup,
            corpus: &mut corpus,
            interactive: request.interactive,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::apply_changes;

    const MODEL: &str = "package com.example\n\nclass User(val name: String, val age: Int)\nclass User2(val name: String) {\n    constructor(name: String, age: Int) : this(name)\n}\n";

    fn index() -> DeclarationIndex {
        let mut index = DeclarationIndex::new();
        index.update("file:///model.kt", MODEL);
        index
    }

    fn request(source: &str, mode: ValueMode) -> FillRequest {
        FillRequest {
            offset: source.rfind("User").unwrap_or_default() + 1,
            mode,
            choice: None,
            expected_label: None,
            interactive: false,
        }
    }

    #[test]
    fn fills_constructor_call() {
        let source = "package app\n\nimport com.example.User\n\nval u = User()\n";
        let outcome = fill_at(
            &index(),
            source,
            &FillConfig::default(),
            &request(source, ValueMode::EmptyDefaults),
        )
        .unwrap();
        assert_eq!(
            apply_changes(source, &outcome.changes),
            "package app\n\nimport com.example.User\n\nval u = User(name = \"\", age = 0)\n"
        );
    }

    #[test]
    fn same_name_mode() {
        let source = "package com.example\n\nval u = User()\n";
        let outcome = fill_at(
            &index(),
            source,
            &FillConfig::default(),
            &request(source, ValueMode::SameNameAsParameter),
        )
        .unwrap();
        assert_eq!(
            apply_changes(source, &outcome.changes),
            "package com.example\n\nval u = User(name = name, age = age)\n"
        );
    }

    #[test]
    fn overloads_need_a_choice() {
        let source = "package com.example\n\nval u = User2()\n";
        let proposal = propose_at(&index(), source, source.find("User2").unwrap()).unwrap();
        assert!(matches!(proposal.selection(), Ok(Selection::Choose(labels)) if labels.len() == 2));
        assert_eq!(proposal.title(ValueMode::EmptyDefaults), "Fill class constructor");

        let mut req = request(source, ValueMode::EmptyDefaults);
        req.choice = Some(1);
        let outcome = fill_at(&index(), source, &FillConfig::default(), &req).unwrap();
        assert_eq!(outcome.plan.parameter_names(), vec!["name", "age"]);

        req.choice = Some(5);
        assert_eq!(
            fill_at(&index(), source, &FillConfig::default(), &req),
            Err(FillError::InvalidChoice {
                index: 5,
                available: 2
            })
        );
    }

    #[test]
    fn changed_candidate_is_a_mutation_failure() {
        let source = "package com.example\n\nval u = User()\n";
        let mut req = request(source, ValueMode::EmptyDefaults);
        req.expected_label = Some("User(name: String)".to_string());
        assert!(matches!(
            fill_at(&index(), source, &FillConfig::default(), &req),
            Err(FillError::MutationFailure(_))
        ));
    }

    #[test]
    fn nothing_to_fill() {
        let source = "package com.example\n\nval u = User(\"a\", 1)\n";
        assert_eq!(
            propose_at(&index(), source, source.find("User").unwrap()).map(|p| p.candidates.len()),
            Err(FillError::NotApplicable)
        );
        assert!(matches!(
            propose_at(&index(), "val x = 1\n", 4),
            Err(FillError::UnresolvableTarget(_))
        ));
    }
}
