// crates/numport-cli/src/logging.rs
// ============================================================================
// Module: CLI Logging
// Description: Tracing subscriber setup for the CLI.
// Purpose: Route structured logs to stderr under an env-controlled filter.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! Logs go to stderr so stdout stays machine-readable. The filter comes from
//! `NUMPORT_LOG`, then `RUST_LOG`, then defaults to `info`; an unparsable
//! directive falls back to the default rather than failing the command.

use std::env;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::CliError;

/// Environment variable holding the CLI log filter.
pub const LOG_ENV: &str = "NUMPORT_LOG";
/// Fallback environment variable for the log filter.
pub const RUST_LOG_ENV: &str = "RUST_LOG";
/// Filter used when neither variable is usable.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Picks the filter from the first non-empty, parsable directive.
#[must_use]
pub fn env_filter(numport_log: Option<&str>, rust_log: Option<&str>) -> EnvFilter {
    [numport_log, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`CliError::Output`] when a global subscriber is already set.
pub fn init_logging() -> Result<(), CliError> {
    let app_level = env::var(LOG_ENV).ok();
    let rust_log = env::var(RUST_LOG_ENV).ok();
    let filter = env_filter(app_level.as_deref(), rust_log.as_deref());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|err| CliError::Output {
            stream: "stderr",
            error: err.to_string(),
        })
}
