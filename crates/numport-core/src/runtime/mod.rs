// crates/numport-core/src/runtime/mod.rs
// ============================================================================
// Module: Numport Runtime
// Description: Validation, sanitization, lifecycle, sync, and recovery engines.
// Purpose: Execute the porting request lifecycle against the interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the porting engine: field validators, the input
//! sanitizer and audit log, the upload validator, the compatibility resolver,
//! the request state machine and ledger, the real-time sync channel, the error
//! recovery manager, and the form orchestrator that composes them. The CLI and
//! the HTTP providers call into these modules rather than duplicating rules.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit_log;
pub mod compatibility;
pub mod form;
pub mod ledger;
pub mod machine;
pub mod memory;
pub mod recovery;
pub mod sanitizer;
pub mod sync;
pub mod upload;
pub mod validators;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit_log::AuditLog;
pub use audit_log::AuditSummary;
pub use audit_log::FileAuditSink;
pub use audit_log::StderrAuditSink;
pub use compatibility::CompatibilityResolver;
pub use compatibility::CompatibilityRule;
pub use compatibility::NetworkCompatibilityEntry;
pub use form::ConsentKind;
pub use form::DocumentError;
pub use form::FieldUpdate;
pub use form::PortingForm;
pub use form::PortingServices;
pub use form::SubmitError;
pub use ledger::EventDisposition;
pub use ledger::IgnoreReason;
pub use ledger::RequestLedger;
pub use machine::RequestStateMachine;
pub use machine::StateIntegrityFault;
pub use machine::TransitionError;
pub use machine::TransitionOutcome;
pub use memory::InMemoryPortingBackend;
pub use memory::StaticDocumentVerifier;
pub use recovery::BackoffConfig;
pub use recovery::RecoveryAttempt;
pub use recovery::RecoveryDashboard;
pub use recovery::RecoveryError;
pub use recovery::RecoveryManager;
pub use recovery::RecoveryStats;
pub use recovery::RetryPolicy;
pub use sanitizer::InputSanitizer;
pub use sanitizer::RateLimitConfig;
pub use sanitizer::SanitizeContext;
pub use sanitizer::SanitizeOutcome;
pub use sanitizer::SanitizerConfig;
pub use sanitizer::ViolationKind;
pub use sync::CollectingNotifier;
pub use sync::Subscription;
pub use sync::SubscriptionReport;
pub use sync::SyncChannel;
pub use sync::SyncError;
pub use sync::TracingNotifier;
pub use upload::UploadPolicy;
pub use upload::UploadValidator;
pub use upload::UploadVerdict;
pub use upload::UploadViolation;
pub use validators::FieldValidators;
