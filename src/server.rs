/// LSP server trait implementation.
///
/// This module contains the `impl LanguageServer for Backend` block,
/// which handles the protocol messages: initialization, document sync,
/// configuration changes, and the fill quick fix through
/// `textDocument/codeAction` and `codeAction/resolve`.
use std::collections::HashMap;
use std::sync::atomic::Ordering;

use serde::{Deserialize, Serialize};
use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

use crate::config::FillConfig;
use crate::fill::Selection;
use crate::kotlin::{self, DeclarationIndex};
use crate::quickfix::{self, FillRequest};
use crate::types::ValueMode;
use crate::util::{apply_changes, position_to_offset, to_lsp_range, to_text_edits};
use crate::{Backend, PLACE_CURSORS_COMMAND};

/// What a code action needs to be resolved later.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActionData {
    uri: Url,
    position: Position,
    mode: ValueMode,
    candidate: usize,
    label: String,
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        #[allow(deprecated)]
        let workspace_root = params
            .root_uri
            .as_ref()
            .or_else(|| {
                params
                    .workspace_folders
                    .as_ref()
                    .and_then(|folders| folders.first())
                    .map(|folder| &folder.uri)
            })
            .and_then(|uri| uri.to_file_path().ok());
        if let Some(root) = workspace_root {
            *self.workspace_root.lock() = Some(root);
        }

        let supports_resolve = params
            .capabilities
            .text_document
            .as_ref()
            .and_then(|t| t.code_action.as_ref())
            .and_then(|c| c.resolve_support.as_ref())
            .is_some_and(|r| r.properties.iter().any(|p| p == "edit"));
        self.supports_resolve.store(supports_resolve, Ordering::Relaxed);

        if let Some(options) = params.initialization_options {
            let config = self.file_config.lock().with_lsp_settings(&options);
            match config {
                Ok(config) => *self.config.lock() = config,
                Err(e) => tracing::warn!("ignoring initializationOptions: {}", e),
            }
            *self.initialization_options.lock() = Some(options);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                code_action_provider: Some(CodeActionProviderCapability::Options(
                    CodeActionOptions {
                        code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                        resolve_provider: Some(true),
                        work_done_progress_options: WorkDoneProgressOptions::default(),
                    },
                )),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: self.name.clone(),
                version: Some(self.version.clone()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let workspace_root = self.workspace_root.lock().clone();

        match FillConfig::load(workspace_root.as_deref()) {
            Ok(file_config) => {
                let options = self.initialization_options.lock().clone();
                let effective = match &options {
                    Some(options) => file_config.with_lsp_settings(options),
                    None => Ok(file_config.clone()),
                };
                *self.file_config.lock() = file_config;
                match effective {
                    Ok(config) => *self.config.lock() = config,
                    Err(e) => tracing::warn!("ignoring initializationOptions: {}", e),
                }
            }
            Err(e) => {
                self.log(MessageType::WARNING, format!("FillClass: {}", e)).await;
            }
        }

        let Some(root) = workspace_root else {
            self.log(MessageType::INFO, "FillClass initialized".to_string())
                .await;
            return;
        };

        let mut fresh = DeclarationIndex::new();
        let count = kotlin::index_workspace(&mut fresh, &root);
        for (uri, text) in self.open_files.lock().iter() {
            fresh.update(uri, text);
        }
        *self.index.lock() = fresh;

        self.log(
            MessageType::INFO,
            format!("FillClass initialized! Indexed {} source file(s)", count),
        )
        .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let uri = doc.uri.to_string();
        self.index.lock().update(&uri, &doc.text);
        self.open_files.lock().insert(uri, doc.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        // Full sync: the last change holds the whole document.
        if let Some(change) = params.content_changes.into_iter().next_back() {
            self.index.lock().update(&uri, &change.text);
            self.open_files.lock().insert(uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.open_files.lock().remove(uri.as_str());

        // Fall back to the saved file; unsaved buffers disappear.
        let on_disk = uri
            .to_file_path()
            .ok()
            .and_then(|path| std::fs::read_to_string(path).ok());
        let mut index = self.index.lock();
        match on_disk {
            Some(content) => index.update(uri.as_str(), &content),
            None => index.remove(uri.as_str()),
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let updated = self.file_config.lock().with_lsp_settings(&params.settings);
        match updated {
            Ok(config) => {
                tracing::info!("configuration updated");
                *self.config.lock() = config;
            }
            Err(e) => {
                self.log(MessageType::WARNING, format!("FillClass: {}", e)).await;
            }
        }
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let position = params.range.start;
        let Some(content) = self.open_files.lock().get(uri.as_str()).cloned() else {
            return Ok(None);
        };
        let offset = position_to_offset(&content, position);

        let proposal = {
            let index = self.index.lock();
            quickfix::propose_at(&index, &content, offset)
        };
        let proposal = match proposal {
            Ok(proposal) => proposal,
            Err(e) => {
                tracing::debug!("no fill at {}:{:?}: {}", uri, position, e);
                return Ok(None);
            }
        };
        let labels = match proposal.selection() {
            Ok(Selection::Chosen(candidate)) => vec![(None, candidate.label())],
            Ok(Selection::Choose(labels)) => labels.into_iter().map(|l| (Some(l.clone()), l)).collect(),
            Err(_) => return Ok(None),
        };

        let config = self.config();
        let eager = !self.supports_resolve.load(Ordering::Relaxed);
        let mut actions = Vec::new();
        for &mode in &config.actions {
            let title = proposal.title(mode);
            for (candidate, (suffix, label)) in labels.iter().enumerate() {
                let data = ActionData {
                    uri: uri.clone(),
                    position,
                    mode,
                    candidate,
                    label: label.clone(),
                };
                let mut action = CodeAction {
                    title: match suffix {
                        Some(suffix) => format!("{}: {}", title, suffix),
                        None => title.clone(),
                    },
                    kind: Some(CodeActionKind::QUICKFIX),
                    data: serde_json::to_value(&data).ok(),
                    ..CodeAction::default()
                };
                if eager {
                    action = self.resolve_action(action, &data);
                    if action.edit.is_none() {
                        continue;
                    }
                }
                actions.push(CodeActionOrCommand::CodeAction(action));
            }
        }

        Ok((!actions.is_empty()).then_some(actions))
    }

    async fn code_action_resolve(&self, action: CodeAction) -> Result<CodeAction> {
        let data = action
            .data
            .clone()
            .and_then(|d| serde_json::from_value::<ActionData>(d).ok());
        Ok(match data {
            Some(data) => self.resolve_action(action, &data),
            None => action,
        })
    }
}

impl Backend {
    /// Attach the fill edit (and the cursor command) to `action`.  On any
    /// failure the action is returned without an edit.
    fn resolve_action(&self, mut action: CodeAction, data: &ActionData) -> CodeAction {
        let Some(content) = self.open_files.lock().get(data.uri.as_str()).cloned() else {
            tracing::warn!("cannot resolve fill: {} is not open", data.uri);
            return action;
        };
        let request = FillRequest {
            offset: position_to_offset(&content, data.position),
            mode: data.mode,
            choice: Some(data.candidate),
            expected_label: Some(data.label.clone()),
            interactive: true,
        };
        let config = self.config();
        let outcome = {
            let index = self.index.lock();
            quickfix::fill_at(&index, &content, &config, &request)
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::info!("fill at {} abandoned: {}", data.uri, e);
                return action;
            }
        };

        let edits = to_text_edits(&content, &outcome.changes);
        action.edit = Some(WorkspaceEdit {
            changes: Some(HashMap::from([(data.uri.clone(), edits)])),
            ..WorkspaceEdit::default()
        });

        if !outcome.cursor_stops.is_empty() {
            let edited = apply_changes(&content, &outcome.changes);
            let ranges: Vec<Range> = outcome
                .cursor_stops
                .iter()
                .map(|stop| to_lsp_range(&edited, stop))
                .collect();
            action.command = Some(Command {
                title: "Move to next argument".to_string(),
                command: PLACE_CURSORS_COMMAND.to_string(),
                arguments: Some(vec![serde_json::json!({
                    "uri": data.uri,
                    "ranges": ranges,
                })]),
            });
        }
        action
    }
}
