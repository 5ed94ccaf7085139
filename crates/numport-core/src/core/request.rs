// crates/numport-core/src/core/request.rs
// ============================================================================
// Module: Numport Porting Requests
// Description: Porting applications, evidence, consents, and request status.
// Purpose: Model one customer's intent to move a number between operators.
// Dependencies: crate::core::{identifiers, network, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`PortingApplication`] is the validated output of the porting form. It
//! becomes a [`PortingRequest`] in [`PortingStatus::Draft`], which the request
//! state machine promotes to [`PortingStatus::Submitted`] once the backend
//! persists it. From then on only remote events move the status forward.
//!
//! ## Invariants
//! - Status only moves forward (see [`PortingStatus::can_advance_to`]).
//! - Consents and the digital signature have no mutators on [`PortingRequest`].
//! - `progress_percentage` is within `0..=100`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::NpcReference;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::UserId;
use crate::core::network::Network;
use crate::core::network::Priority;
use crate::core::network::SimType;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Holder Identity
// ============================================================================

/// Identity snapshot of the number holder, in normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    /// Full legal name.
    pub full_name: String,
    /// 13-digit South African ID number.
    pub id_number: String,
    /// Date of birth as `YYYY-MM-DD`.
    pub date_of_birth: String,
    /// Contact email (lowercased).
    pub contact_email: String,
    /// Contact mobile in canonical spacing.
    pub contact_mobile: String,
}

// ============================================================================
// SECTION: Consents and Signature
// ============================================================================

/// Consents captured on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consents {
    /// Holder confirms ownership of the number (mandatory).
    pub ownership: bool,
    /// Holder consents to processing of personal data (mandatory).
    pub data_processing: bool,
    /// Holder opts in to marketing (optional).
    pub marketing: bool,
}

impl Consents {
    /// Returns true when both mandatory consents are granted.
    #[must_use]
    pub const fn mandatory_granted(&self) -> bool {
        self.ownership && self.data_processing
    }
}

/// Typed-name attestation captured at submit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalSignature {
    /// Name exactly as the holder typed it (trimmed).
    pub signed_name: String,
    /// Time the signature was captured.
    pub signed_at: Timestamp,
}

// ============================================================================
// SECTION: Documents
// ============================================================================

/// Kind of evidentiary document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Identity document or passport.
    IdDocument,
    /// Utility bill or similar proof of residence.
    ProofOfAddress,
    /// Statement from the current operator.
    AccountStatement,
    /// Sworn affidavit.
    Affidavit,
}

impl DocumentKind {
    /// Parses a document kind label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "id_document" | "id" => Some(Self::IdDocument),
            "proof_of_address" => Some(Self::ProofOfAddress),
            "account_statement" => Some(Self::AccountStatement),
            "affidavit" => Some(Self::Affidavit),
            _ => None,
        }
    }
}

/// Metadata of a file the holder uploaded.
///
/// Content is never inspected here; only the name, size, and declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    /// File name as supplied by the browser or client.
    pub name: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Declared MIME type, if any.
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Result returned by the external document verification service.
///
/// The engine passes these values through untouched; it never recomputes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// Authenticity score in percent.
    pub authenticity_percent: f64,
    /// Fraud score reported by the service.
    pub fraud_score: f64,
    /// Fields the service extracted from the document.
    #[serde(default)]
    pub extracted_fields: BTreeMap<String, Value>,
}

/// Uploaded document plus its verification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEvidence {
    /// Document kind.
    pub kind: DocumentKind,
    /// Sanitized file name.
    pub file_name: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Verification service result, when the service was reachable.
    pub verification: Option<VerificationReport>,
}

// ============================================================================
// SECTION: Status
// ============================================================================

/// Lifecycle status of a porting request.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortingStatus {
    /// Local, unsaved, may be abandoned.
    Draft,
    /// Persisted by the backend and awaiting processing.
    Submitted,
    /// Clearinghouse processing in progress.
    Processing,
    /// Port executed.
    Completed,
    /// Port refused.
    Rejected,
}

impl PortingStatus {
    /// Returns the position of the status in the lifecycle.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::Submitted => 1,
            Self::Processing => 2,
            Self::Completed | Self::Rejected => 3,
        }
    }

    /// Returns true for `Completed` and `Rejected`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Returns true when a remote event may move a request from `self` to `next`.
    ///
    /// Remote events may skip forward but never enter `Draft` or `Submitted`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        match (self, next) {
            (
                Self::Submitted | Self::Processing,
                Self::Processing | Self::Completed | Self::Rejected,
            ) => next.rank() > self.rank(),
            _ => false,
        }
    }

    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "submitted" | "pending" => Some(Self::Submitted),
            "processing" | "in_progress" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "rejected" | "failed" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for PortingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Application
// ============================================================================

/// Fully validated form contents, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortingApplication {
    /// Owner of the request.
    pub user_id: UserId,
    /// Number being ported, in canonical spacing.
    pub phone_number: String,
    /// Operator currently holding the number.
    pub current_network: Network,
    /// Operator receiving the number.
    pub target_network: Network,
    /// Holder identity snapshot.
    pub holder: Holder,
    /// Requested SIM form factor.
    pub sim_type: SimType,
    /// Requested priority.
    pub priority: Priority,
    /// Requested cutover; `None` means as soon as possible.
    pub scheduled_cutover: Option<Timestamp>,
    /// Attached evidence, in upload order.
    pub documents: Vec<DocumentEvidence>,
    /// Consents captured on the form.
    pub consents: Consents,
    /// Typed signature.
    pub digital_signature: Option<DigitalSignature>,
}

// ============================================================================
// SECTION: Porting Request
// ============================================================================

/// One customer's porting request as tracked by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortingRequest {
    /// Backend identifier; `None` while in `Draft`.
    id: Option<RequestId>,
    /// Validated application contents.
    application: PortingApplication,
    /// Lifecycle status.
    status: PortingStatus,
    /// Clearinghouse progress, `0..=100`.
    progress_percentage: u8,
    /// Clearinghouse reference once assigned.
    npc_reference: Option<NpcReference>,
    /// Time the backend accepted the request.
    submitted_at: Option<Timestamp>,
}

impl PortingRequest {
    /// Creates a draft request from a validated application.
    #[must_use]
    pub const fn draft(application: PortingApplication) -> Self {
        Self {
            id: None,
            application,
            status: PortingStatus::Draft,
            progress_percentage: 0,
            npc_reference: None,
            submitted_at: None,
        }
    }

    /// Rebuilds a persisted request from backend state.
    #[must_use]
    pub const fn restore(
        id: RequestId,
        application: PortingApplication,
        status: PortingStatus,
        progress_percentage: u8,
        npc_reference: Option<NpcReference>,
        submitted_at: Timestamp,
    ) -> Self {
        Self {
            id: Some(id),
            application,
            status,
            progress_percentage,
            npc_reference,
            submitted_at: Some(submitted_at),
        }
    }

    /// Returns the backend identifier, if persisted.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    /// Returns the application contents.
    #[must_use]
    pub const fn application(&self) -> &PortingApplication {
        &self.application
    }

    /// Returns the owner of the request.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.application.user_id
    }

    /// Returns the number being ported.
    #[must_use]
    pub fn phone_number(&self) -> &str {
        &self.application.phone_number
    }

    /// Returns the captured consents.
    #[must_use]
    pub const fn consents(&self) -> &Consents {
        &self.application.consents
    }

    /// Returns the captured signature.
    #[must_use]
    pub const fn digital_signature(&self) -> Option<&DigitalSignature> {
        self.application.digital_signature.as_ref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> PortingStatus {
        self.status
    }

    /// Returns the clearinghouse progress.
    #[must_use]
    pub const fn progress_percentage(&self) -> u8 {
        self.progress_percentage
    }

    /// Returns the clearinghouse reference.
    #[must_use]
    pub const fn npc_reference(&self) -> Option<&NpcReference> {
        self.npc_reference.as_ref()
    }

    /// Returns the time the backend accepted the request.
    #[must_use]
    pub const fn submitted_at(&self) -> Option<Timestamp> {
        self.submitted_at
    }

    /// Records backend persistence.
    pub(crate) fn record_submission(&mut self, id: RequestId, at: Timestamp) {
        self.id = Some(id);
        self.status = PortingStatus::Submitted;
        self.submitted_at = Some(at);
    }

    /// Sets the lifecycle status.
    pub(crate) const fn set_status(&mut self, status: PortingStatus) {
        self.status = status;
    }

    /// Sets the clearinghouse progress.
    pub(crate) const fn set_progress(&mut self, progress: u8) {
        self.progress_percentage = progress;
    }

    /// Sets the clearinghouse reference.
    pub(crate) fn set_npc_reference(&mut self, reference: NpcReference) {
        self.npc_reference = Some(reference);
    }
}
