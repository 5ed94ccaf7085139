// crates/numport-config/src/lib.rs
// ============================================================================
// Module: Numport Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for numport.toml semantics.
// Dependencies: numport-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `numport-config` defines the configuration model for the porting engine.
//! It provides strict, fail-closed validation and converts validated sections
//! into the runtime policies used by `numport-core`.
//!
//! Credentials are never read from the file; the backend section names the
//! environment variable that holds the bearer token.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
