#![allow(dead_code)]

use fillclass_lsp::Backend;
use std::fs;
use tower_lsp::LanguageServer;
use tower_lsp::lsp_types::*;

pub fn create_test_backend() -> Backend {
    Backend::new_test()
}

/// Helper: create a temp workspace holding the given source files, then
/// return a Backend rooted at it.
pub fn create_workspace(files: &[(&str, &str)]) -> (Backend, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    for (rel_path, content) in files {
        let full = dir.path().join(rel_path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("failed to create dirs");
        }
        fs::write(&full, content).expect("failed to write source file");
    }

    let backend = Backend::new_test_with_workspace(dir.path().to_path_buf());
    (backend, dir)
}

/// Open `text` as a Kotlin document.
pub async fn open(backend: &Backend, uri: &Url, text: &str) {
    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "kotlin".to_string(),
                version: 1,
                text: text.to_string(),
            },
        })
        .await;
}

/// Request code actions at `line`/`character`.
pub async fn code_actions_at(
    backend: &Backend,
    uri: &Url,
    line: u32,
    character: u32,
) -> Vec<CodeAction> {
    let position = Position { line, character };
    let params = CodeActionParams {
        text_document: TextDocumentIdentifier { uri: uri.clone() },
        range: Range {
            start: position,
            end: position,
        },
        context: CodeActionContext::default(),
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };
    backend
        .code_action(params)
        .await
        .expect("code_action failed")
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| match item {
            CodeActionOrCommand::CodeAction(action) => Some(action),
            CodeActionOrCommand::Command(_) => None,
        })
        .collect()
}

/// Apply the single-file workspace edit of `action` to `text`.
pub fn apply_action(text: &str, uri: &Url, action: &CodeAction) -> String {
    let edits = action
        .edit
        .as_ref()
        .and_then(|e| e.changes.as_ref())
        .and_then(|c| c.get(uri))
        .cloned()
        .expect("action should carry an edit");
    apply_text_edits(text, edits)
}

fn apply_text_edits(text: &str, mut edits: Vec<TextEdit>) -> String {
    let mut out = text.to_string();
    edits.sort_by_key(|e| (e.range.start.line, e.range.start.character));
    for edit in edits.into_iter().rev() {
        let start = offset(&out, edit.range.start);
        let end = offset(&out, edit.range.end);
        out.replace_range(start..end, &edit.new_text);
    }
    out
}

/// Byte offset of an ASCII-only position.
fn offset(text: &str, position: Position) -> usize {
    let mut line_start = 0;
    for _ in 0..position.line {
        line_start += text[line_start..].find('\n').map_or(0, |i| i + 1);
    }
    line_start + position.character as usize
}
