// crates/numport-core/src/core/mod.rs
// ============================================================================
// Module: Numport Core Types
// Description: Canonical porting data model, audit records, and change events.
// Purpose: Provide stable, serializable types shared by the runtime and adapters.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Core types define porting applications and requests, their lifecycle
//! status, validation outcomes, security audit entries, and the backend change
//! events that drive remote transitions. These types are the canonical source
//! of truth for the CLI and the HTTP providers.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod access;
pub mod audit;
pub mod events;
pub mod hashing;
pub mod identifiers;
pub mod network;
pub mod request;
pub mod time;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::AccessError;
pub use access::AdminCapability;
pub use access::Principal;
pub use access::Role;
pub use audit::AuditAction;
pub use audit::RiskLevel;
pub use audit::SecurityAuditEntry;
pub use events::ChangeEvent;
pub use events::ChangeEventType;
pub use events::EventDecodeError;
pub use events::PORTING_REQUESTS_TABLE;
pub use events::RemoteUpdate;
pub use hashing::Fingerprint;
pub use hashing::HashError;
pub use identifiers::NpcReference;
pub use identifiers::RequestId;
pub use identifiers::UserId;
pub use network::Network;
pub use network::Priority;
pub use network::SimType;
pub use request::Consents;
pub use request::DigitalSignature;
pub use request::DocumentEvidence;
pub use request::DocumentKind;
pub use request::FileUpload;
pub use request::Holder;
pub use request::PortingApplication;
pub use request::PortingRequest;
pub use request::PortingStatus;
pub use request::VerificationReport;
pub use time::Clock;
pub use time::FixedClock;
pub use time::SystemClock;
pub use time::Timestamp;
pub use validation::FieldName;
pub use validation::ValidationResult;
