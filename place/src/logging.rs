//! Diagnostic tracing for the `place` CLI.
//!
//! Output goes to stderr so it never mixes with command output on stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for diagnostics.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset, so failed cache
/// purges are visible without extra flags.
///
/// # Example
/// ```bash
/// RUST_LOG=place=debug place paint 2 1
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
