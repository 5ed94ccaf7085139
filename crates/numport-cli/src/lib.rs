// crates/numport-cli/src/lib.rs
// ============================================================================
// Module: Numport CLI Library
// Description: Shared helpers for the Numport command-line interface.
// Purpose: Keep service wiring and submission logic testable outside the binary.
// Dependencies: numport-core, numport-config, numport-providers
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) parses arguments and writes output;
//! everything else lives here so integration tests can drive it directly.
//!
//! Security posture: CLI inputs are untrusted and must be validated before
//! they reach the porting form.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Error type shared by CLI commands.
pub mod error;
pub mod logging;
pub mod services;
pub mod submission;

pub use error::CliError;
pub use error::CliResult;
