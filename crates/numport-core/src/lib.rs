// crates/numport-core/src/lib.rs
// ============================================================================
// Module: Numport Core Library
// Description: Public API surface for the number porting lifecycle engine.
// Purpose: Expose core types, interfaces, and runtime engines.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Numport core validates, sanitizes, tracks, and reconciles mobile number
//! porting requests. It does not execute ports: persistence, document
//! verification, and the real-time change feed are reached through explicit
//! interfaces so the same engine runs against in-memory collaborators in tests
//! and HTTP providers in deployment.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AuditSink;
pub use interfaces::BackendError;
pub use interfaces::ChangeFeed;
pub use interfaces::DocumentVerifier;
pub use interfaces::FeedError;
pub use interfaces::Notifier;
pub use interfaces::PersistReceipt;
pub use interfaces::PersistRequest;
pub use interfaces::PortingBackend;
pub use interfaces::Recoverable;
pub use interfaces::StatusNotification;
pub use interfaces::VerificationError;
pub use runtime::*;
