//! FillClass: a Kotlin language server quick fix that fills the missing
//! arguments of a constructor or function call.
//!
//! - [`fill`]: the argument synthesis engine
//! - [`kotlin`]: the text-level declaration index and call-site locator
//! - [`quickfix`]: one fill at a document position
//! - [`server`]: the `LanguageServer` implementation
//! - [`config`] and [`logging`]: the ambient setup shared with the CLI

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use parking_lot::Mutex;
use tower_lsp::Client;

pub mod config;
pub mod fill;
pub mod kotlin;
pub mod logging;
pub mod quickfix;
mod server;
pub mod types;
pub mod util;

use crate::config::FillConfig;
use crate::kotlin::DeclarationIndex;

/// Client-side command that steps the cursor through the inserted
/// arguments.  Its single argument is `{ "uri", "ranges" }`.
pub const PLACE_CURSORS_COMMAND: &str = "fillclass.placeCursors";

pub struct Backend {
    name: String,
    version: String,
    /// Full text of every open document, keyed by URI.
    open_files: Arc<Mutex<HashMap<String, String>>>,
    index: Arc<Mutex<DeclarationIndex>>,
    /// Configuration from the TOML files only.
    file_config: Arc<Mutex<FillConfig>>,
    /// Effective configuration, including LSP settings.
    config: Arc<Mutex<FillConfig>>,
    /// `initializationOptions`, applied once the files are loaded.
    initialization_options: Arc<Mutex<Option<serde_json::Value>>>,
    workspace_root: Arc<Mutex<Option<PathBuf>>>,
    /// Whether the client resolves code actions lazily.
    supports_resolve: AtomicBool,
    client: Option<Client>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client: Some(client),
            ..Self::new_test()
        }
    }

    /// A backend without a client, for tests.
    pub fn new_test() -> Self {
        Self {
            name: "FillClass".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            open_files: Arc::new(Mutex::new(HashMap::new())),
            index: Arc::new(Mutex::new(DeclarationIndex::new())),
            file_config: Arc::new(Mutex::new(FillConfig::default())),
            config: Arc::new(Mutex::new(FillConfig::default())),
            initialization_options: Arc::new(Mutex::new(None)),
            workspace_root: Arc::new(Mutex::new(None)),
            supports_resolve: AtomicBool::new(false),
            client: None,
        }
    }

    /// A backend rooted at `root`, for tests.
    pub fn new_test_with_workspace(root: PathBuf) -> Self {
        let backend = Self::new_test();
        *backend.workspace_root.lock() = Some(root);
        backend
    }

    /// Number of files currently in the declaration index.
    pub fn indexed_file_count(&self) -> usize {
        self.index.lock().len()
    }

    /// The effective configuration.
    pub fn config(&self) -> FillConfig {
        self.config.lock().clone()
    }
}
