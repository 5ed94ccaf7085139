// crates/numport-core/src/core/audit.rs
// ============================================================================
// Module: Numport Security Audit Records
// Description: Risk levels and security audit entries.
// Purpose: Describe security-relevant input events for the admin audit view.
// Dependencies: crate::core::{time, validation}, serde
// ============================================================================

//! ## Overview
//! Audit entries record sanitizer and upload decisions. They are kept in a
//! process-local ring buffer for operational visibility and are not a
//! compliance-grade log.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::time::Timestamp;
use crate::core::validation::FieldName;

// ============================================================================
// SECTION: Risk Level
// ============================================================================

/// Risk classification for a security-relevant event.
///
/// # Invariants
/// - Ordering is `Low < Medium < High`; aggregation takes the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Benign or informational.
    #[default]
    Low,
    /// Suspicious but plausibly accidental.
    Medium,
    /// Deliberate attack pattern or abuse.
    High,
}

impl RiskLevel {
    /// Returns a stable label for the risk level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

// ============================================================================
// SECTION: Audit Entries
// ============================================================================

/// Audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Input passed the sanitizer.
    InputAccepted,
    /// Input was denied by the sanitizer.
    InputRejected,
    /// Identity exceeded the sanitizer rate limit.
    RateLimitExceeded,
    /// Uploaded document was rejected.
    UploadRejected,
}

/// Append-only record of a security-relevant input event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAuditEntry {
    /// Time the event was observed.
    pub timestamp: Timestamp,
    /// Audited action.
    pub action: AuditAction,
    /// Form field involved, when the input targeted one.
    pub field_name: Option<FieldName>,
    /// Identity the input was attributed to.
    pub identity: Option<String>,
    /// Redacted description of the event.
    pub details: String,
    /// Risk classification.
    pub risk_level: RiskLevel,
}
