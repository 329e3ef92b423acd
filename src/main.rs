use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tower_lsp::lsp_types::{Position, Url};
use tower_lsp::{LspService, Server};

use fillclass_lsp::Backend;
use fillclass_lsp::config::FillConfig;
use fillclass_lsp::kotlin::{self, DeclarationIndex};
use fillclass_lsp::logging::init_logging;
use fillclass_lsp::quickfix::{self, FillRequest};
use fillclass_lsp::types::ValueMode;
use fillclass_lsp::util::{apply_changes, position_to_offset};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the language server on stdio (the default)
    Lsp,
    /// Fill the call at a position and print the rewritten file
    Fill {
        /// Kotlin source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 1-based line of the call
        #[arg(long)]
        line: u32,

        /// 1-based column of the call
        #[arg(long)]
        column: u32,

        #[arg(long, value_enum, default_value_t = Mode::Empty)]
        mode: Mode,

        /// Overload to fill when several apply (0-based)
        #[arg(long)]
        candidate: Option<usize>,

        /// Seed for reproducible dummy values
        #[arg(long)]
        seed: Option<u64>,

        /// Directory to index (defaults to the file's directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Empty,
    Dummy,
    SameName,
}

impl From<Mode> for ValueMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Empty => ValueMode::EmptyDefaults,
            Mode::Dummy => ValueMode::DummyValues,
            Mode::SameName => ValueMode::SameNameAsParameter,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command.unwrap_or(Commands::Lsp) {
        Commands::Lsp => {
            let (service, socket) = LspService::new(Backend::new);
            Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
                .serve(service)
                .await;
            ExitCode::SUCCESS
        }
        Commands::Fill {
            file,
            line,
            column,
            mode,
            candidate,
            seed,
            workspace,
        } => match run_fill(file, line, column, mode.into(), candidate, seed, workspace) {
            Ok(output) => {
                print!("{}", output);
                ExitCode::SUCCESS
            }
            Err(message) => {
                eprintln!("fillclass: {}", message);
                ExitCode::FAILURE
            }
        },
    }
}

/// A headless, non-interactive fill: the first candidate unless one is
/// chosen, no cursor stops.
fn run_fill(
    file: PathBuf,
    line: u32,
    column: u32,
    mode: ValueMode,
    candidate: Option<usize>,
    seed: Option<u64>,
    workspace: Option<PathBuf>,
) -> Result<String, String> {
    let file = std::fs::canonicalize(&file).map_err(|e| format!("{}: {}", file.display(), e))?;
    let content = std::fs::read_to_string(&file).map_err(|e| format!("{}: {}", file.display(), e))?;
    let root = workspace
        .or_else(|| file.parent().map(PathBuf::from))
        .ok_or_else(|| format!("{}: no parent directory", file.display()))?;

    let mut config = FillConfig::load(Some(&root)).map_err(|e| e.to_string())?;
    if seed.is_some() {
        config.dummy_seed = seed;
    }

    let mut index = DeclarationIndex::new();
    kotlin::index_workspace(&mut index, &root);
    if let Ok(uri) = Url::from_file_path(&file) {
        index.update(uri.as_str(), &content);
    }

    let position = Position::new(line.saturating_sub(1), column.saturating_sub(1));
    let request = FillRequest {
        offset: position_to_offset(&content, position),
        mode,
        choice: candidate,
        expected_label: None,
        interactive: false,
    };
    let outcome =
        quickfix::fill_at(&index, &content, &config, &request).map_err(|e| e.to_string())?;
    Ok(apply_changes(&content, &outcome.changes))
}
