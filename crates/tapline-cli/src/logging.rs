//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the filter comes from `-q`/`-v`.
//! Logs go to stderr so command output on stdout stays parseable.

use crate::config::Verbosity;
use tracing_subscriber::EnvFilter;

/// Build the env filter for a verbosity level
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()))
}

/// Install the global subscriber; a second call is a no-op
pub fn init(verbosity: Verbosity, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_ok() {
        tracing::debug!(verbosity = ?verbosity, json, "Logging initialized");
    }
}
