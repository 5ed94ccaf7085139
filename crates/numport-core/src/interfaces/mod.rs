// crates/numport-core/src/interfaces/mod.rs
// ============================================================================
// Module: Numport Interfaces
// Description: Backend-agnostic seams for persistence, verification, events, and sinks.
// Purpose: Define the contract surfaces used by the porting runtime.
// Dependencies: crate::core, async-trait, tokio, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the porting engine reaches the backend, the document
//! verification service, and the real-time change feed without embedding
//! transport details. Implementations must fail closed and classify their
//! errors as transient or fatal so the recovery manager can decide whether to
//! retry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::Receiver;

use crate::core::ChangeEvent;
use crate::core::Consents;
use crate::core::DigitalSignature;
use crate::core::DocumentEvidence;
use crate::core::FileUpload;
use crate::core::Holder;
use crate::core::Network;
use crate::core::PortingApplication;
use crate::core::PortingRequest;
use crate::core::PortingStatus;
use crate::core::Priority;
use crate::core::RequestId;
use crate::core::SecurityAuditEntry;
use crate::core::SimType;
use crate::core::Timestamp;
use crate::core::UserId;
use crate::core::VerificationReport;

// ============================================================================
// SECTION: Error Classification
// ============================================================================

/// Classifies operation errors for the recovery manager.
pub trait Recoverable {
    /// Returns true when a retry may succeed.
    fn is_transient(&self) -> bool;
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

/// Request type label sent with every persistence call.
pub const PORTING_REQUEST_TYPE: &str = "number_porting";

/// Payload of the "insert porting request" call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistRequest {
    /// Owner of the request.
    pub user_id: UserId,
    /// Number being ported.
    pub phone_number: String,
    /// Operator currently holding the number.
    pub current_network: Network,
    /// Operator receiving the number.
    pub target_network: Network,
    /// Request type label.
    pub request_type: String,
    /// Requested priority.
    pub priority: Priority,
    /// Requested cutover.
    pub scheduled_cutover: Option<Timestamp>,
    /// Attached evidence.
    pub documents: Vec<DocumentEvidence>,
    /// Requested SIM form factor.
    pub sim_type: SimType,
    /// Holder identity snapshot.
    pub holder: Holder,
    /// Consents captured on the form.
    pub consents: Consents,
    /// Typed signature.
    pub digital_signature: Option<DigitalSignature>,
}

impl PersistRequest {
    /// Builds the persistence payload for a validated application.
    #[must_use]
    pub fn from_application(application: &PortingApplication) -> Self {
        Self {
            user_id: application.user_id.clone(),
            phone_number: application.phone_number.clone(),
            current_network: application.current_network,
            target_network: application.target_network,
            request_type: PORTING_REQUEST_TYPE.to_string(),
            priority: application.priority,
            scheduled_cutover: application.scheduled_cutover,
            documents: application.documents.clone(),
            sim_type: application.sim_type,
            holder: application.holder.clone(),
            consents: application.consents,
            digital_signature: application.digital_signature.clone(),
        }
    }

    /// Rebuilds the application carried by the payload.
    #[must_use]
    pub fn to_application(&self) -> PortingApplication {
        PortingApplication {
            user_id: self.user_id.clone(),
            phone_number: self.phone_number.clone(),
            current_network: self.current_network,
            target_network: self.target_network,
            holder: self.holder.clone(),
            sim_type: self.sim_type,
            priority: self.priority,
            scheduled_cutover: self.scheduled_cutover,
            documents: self.documents.clone(),
            consents: self.consents,
            digital_signature: self.digital_signature.clone(),
        }
    }
}

/// Backend acknowledgement of a persisted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistReceipt {
    /// Backend-assigned identifier.
    pub id: RequestId,
    /// Initial status reported by the backend.
    pub status: PortingStatus,
}

/// Persistence backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Backend could not be reached or returned a server error.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// Backend did not answer in time.
    #[error("backend timed out: {0}")]
    Timeout(String),
    /// Backend refused the request.
    #[error("backend rejected request: {0}")]
    Rejected(String),
    /// Backend answered with a malformed payload.
    #[error("backend protocol error: {0}")]
    Protocol(String),
}

impl Recoverable for BackendError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Backend that persists porting requests.
#[async_trait]
pub trait PortingBackend: Send + Sync {
    /// Persists a porting request and returns the assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the request cannot be persisted.
    async fn insert_request(&self, request: &PersistRequest)
    -> Result<PersistReceipt, BackendError>;

    /// Lists the porting requests owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the list cannot be fetched.
    async fn list_requests(&self, user_id: &UserId) -> Result<Vec<PortingRequest>, BackendError>;
}

// ============================================================================
// SECTION: Document Verification
// ============================================================================

/// Document verification service errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationError {
    /// Service could not be reached.
    #[error("verification service unavailable: {0}")]
    Unavailable(String),
    /// Service refused the document.
    #[error("verification refused: {0}")]
    Refused(String),
}

impl Recoverable for VerificationError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// External document verification service.
#[async_trait]
pub trait DocumentVerifier: Send + Sync {
    /// Scores an uploaded document.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] when the document cannot be scored.
    async fn verify(&self, file: &FileUpload) -> Result<VerificationReport, VerificationError>;
}

// ============================================================================
// SECTION: Change Feed
// ============================================================================

/// Change feed errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The feed refused or failed the subscription.
    #[error("change feed subscription failed: {0}")]
    Subscribe(String),
}

/// Backend change stream filtered to one user's rows.
pub trait ChangeFeed: Send + Sync {
    /// Opens a subscription for rows owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] when the subscription cannot be opened.
    fn subscribe(&self, user_id: &UserId, capacity: usize)
    -> Result<Receiver<ChangeEvent>, FeedError>;
}

// ============================================================================
// SECTION: Notifications
// ============================================================================

/// User-visible notice of a remote status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotification {
    /// Request that changed.
    pub request_id: RequestId,
    /// Number being ported.
    pub phone_number: String,
    /// Status before the event.
    pub previous: PortingStatus,
    /// Status after the event.
    pub current: PortingStatus,
    /// Message shown to the user.
    pub message: String,
}

/// Receives user-visible notifications.
pub trait Notifier: Send + Sync {
    /// Delivers a notification.
    fn notify(&self, notification: &StatusNotification);
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Mirror for security audit entries.
pub trait AuditSink: Send + Sync {
    /// Records an audit entry.
    fn record(&self, entry: &SecurityAuditEntry);
}
