//! Process-wide tracing subscriber.
//!
//! stdout carries the LSP stream, so all diagnostics go to stderr.  The
//! filter comes from `RUST_LOG` and defaults to `info`.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the subscriber.  Calling this more than once is harmless.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
