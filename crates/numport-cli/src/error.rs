// crates/numport-cli/src/error.rs
// ============================================================================
// Module: CLI Errors
// Description: Error type shared by CLI commands.
// Purpose: Carry failures from every layer to a single stderr message.
// Dependencies: thiserror, numport-core, numport-config, numport-providers
// ============================================================================

use numport_config::ConfigError;
use numport_core::BackendError;
use numport_core::DocumentError;
use numport_core::FieldName;
use numport_core::SubmitError;
use numport_core::SyncError;
use numport_providers::ProviderBuildError;
use thiserror::Error;

/// Failures reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// An HTTP provider could not be constructed.
    #[error(transparent)]
    Provider(#[from] ProviderBuildError),
    /// The backend could not list existing requests.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The local request ledger was unavailable.
    #[error(transparent)]
    Sync(#[from] SyncError),
    /// A document could not be attached.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// The submission failed.
    #[error(transparent)]
    Submit(#[from] SubmitError),
    /// Input file could not be read or parsed.
    #[error("invalid input: {0}")]
    Input(String),
    /// Input named a field the form does not have.
    #[error("unknown field: {0}")]
    UnknownField(String),
    /// The sanitizer refused a field value.
    #[error("input for {0} was rejected by the security filter")]
    Denied(FieldName),
    /// Writing to stdout or stderr failed.
    #[error("failed to write {stream}: {error}")]
    Output {
        /// Stream name.
        stream: &'static str,
        /// Underlying error text.
        error: String,
    },
}

/// CLI result alias for fallible operations.
pub type CliResult<T> = Result<T, CliError>;
