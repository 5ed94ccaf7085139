// crates/numport-core/src/runtime/machine.rs
// ============================================================================
// Module: Numport Request State Machine
// Description: Explicit lifecycle transitions for one porting request.
// Purpose: Accept submission locally and apply remote updates without regressions.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! A [`RequestStateMachine`] owns one [`PortingRequest`]. The only local
//! transition is `Draft -> Submitted`, taken after the backend acknowledges
//! persistence. Every later transition arrives as a [`RemoteUpdate`] and is
//! checked before anything is applied: an update carrying any integrity fault
//! is rejected whole and the current state is preserved.
//!
//! ## Invariants
//! - Status moves forward only; see [`PortingStatus::can_advance_to`].
//! - `progress_percentage` never decreases and never exceeds 100.
//! - The clearinghouse reference is assigned at most once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::NpcReference;
use crate::core::PortingApplication;
use crate::core::PortingRequest;
use crate::core::PortingStatus;
use crate::core::RemoteUpdate;
use crate::core::RequestId;
use crate::core::Timestamp;
use crate::interfaces::PersistReceipt;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Upper bound of the progress percentage.
const MAX_PROGRESS: i64 = 100;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Local transition errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The request already left `Draft`.
    #[error("request is {0}, not draft")]
    NotDraft(PortingStatus),
    /// A mandatory consent is missing.
    #[error("ownership and data processing consents are required")]
    ConsentMissing,
    /// The digital signature is missing or blank.
    #[error("a digital signature is required")]
    SignatureMissing,
}

/// Impossible remote transition.
///
/// Faults are logged and recorded, never shown to the holder.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateIntegrityFault {
    /// The update targets a different request.
    #[error("update for {received} delivered to request {expected}")]
    RequestMismatch {
        /// Request owned by the machine.
        expected: String,
        /// Request named by the update.
        received: RequestId,
    },
    /// The request has not been submitted yet.
    #[error("request is still a draft")]
    NotSubmitted,
    /// The status would move backward or between terminal states.
    #[error("request {request_id}: illegal transition {from} -> {to}")]
    IllegalTransition {
        /// Request affected.
        request_id: RequestId,
        /// Current status.
        from: PortingStatus,
        /// Status carried by the update.
        to: PortingStatus,
    },
    /// Progress would decrease.
    #[error("request {request_id}: progress regression {current} -> {received}")]
    ProgressRegression {
        /// Request affected.
        request_id: RequestId,
        /// Current progress.
        current: u8,
        /// Progress carried by the update.
        received: i64,
    },
    /// Progress is outside `0..=100`.
    #[error("request {request_id}: progress {received} out of range")]
    ProgressOutOfRange {
        /// Request affected.
        request_id: RequestId,
        /// Progress carried by the update.
        received: i64,
    },
    /// The clearinghouse reference would change.
    #[error("request {request_id}: npc reference {current} cannot change to {received}")]
    NpcReferenceChanged {
        /// Request affected.
        request_id: RequestId,
        /// Assigned reference.
        current: NpcReference,
        /// Reference carried by the update.
        received: NpcReference,
    },
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Effect of an applied remote update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    /// Status before the update.
    pub previous_status: PortingStatus,
    /// Status after the update.
    pub status: PortingStatus,
    /// Progress before the update.
    pub previous_progress: u8,
    /// Progress after the update.
    pub progress: u8,
    /// Whether the update assigned the clearinghouse reference.
    pub npc_reference_assigned: bool,
}

impl TransitionOutcome {
    /// Returns true when the status changed.
    #[must_use]
    pub fn status_changed(&self) -> bool {
        self.previous_status != self.status
    }

    /// Returns true when any tracked field changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.status_changed()
            || self.previous_progress != self.progress
            || self.npc_reference_assigned
    }
}

// ============================================================================
// SECTION: State Machine
// ============================================================================

/// Lifecycle owner for one porting request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestStateMachine {
    /// Request under management.
    request: PortingRequest,
}

impl RequestStateMachine {
    /// Starts a machine in `Draft` for a validated application.
    #[must_use]
    pub const fn new(application: PortingApplication) -> Self {
        Self {
            request: PortingRequest::draft(application),
        }
    }

    /// Resumes a machine for a request loaded from the backend.
    #[must_use]
    pub const fn from_request(request: PortingRequest) -> Self {
        Self {
            request,
        }
    }

    /// Returns the managed request.
    #[must_use]
    pub const fn request(&self) -> &PortingRequest {
        &self.request
    }

    /// Consumes the machine and returns the request.
    #[must_use]
    pub fn into_request(self) -> PortingRequest {
        self.request
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> PortingStatus {
        self.request.status()
    }

    /// Checks the local submission preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the request is not a draft, a mandatory
    /// consent is missing, or the signature is blank.
    pub fn check_submittable(&self) -> Result<(), TransitionError> {
        if self.request.status() != PortingStatus::Draft {
            return Err(TransitionError::NotDraft(self.request.status()));
        }
        if !self.request.consents().mandatory_granted() {
            return Err(TransitionError::ConsentMissing);
        }
        let signed = self
            .request
            .digital_signature()
            .is_some_and(|signature| !signature.signed_name.trim().is_empty());
        if !signed {
            return Err(TransitionError::SignatureMissing);
        }
        Ok(())
    }

    /// Enters `Submitted` after the backend persisted the request.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the submission preconditions fail.
    pub fn mark_submitted(
        &mut self,
        receipt: &PersistReceipt,
        at: Timestamp,
    ) -> Result<(), TransitionError> {
        self.check_submittable()?;
        self.request.record_submission(receipt.id.clone(), at);
        Ok(())
    }

    /// Applies a remote update.
    ///
    /// # Errors
    ///
    /// Returns [`StateIntegrityFault`] when any part of the update is
    /// impossible; nothing is applied in that case.
    pub fn apply_remote(
        &mut self,
        update: &RemoteUpdate,
    ) -> Result<TransitionOutcome, StateIntegrityFault> {
        let Some(request_id) = self.request.id().cloned() else {
            return Err(StateIntegrityFault::NotSubmitted);
        };
        if request_id != update.request_id {
            return Err(StateIntegrityFault::RequestMismatch {
                expected: request_id.to_string(),
                received: update.request_id.clone(),
            });
        }

        let previous_status = self.request.status();
        let previous_progress = self.request.progress_percentage();

        let next_status = match update.status {
            Some(next) if next != previous_status => {
                if !previous_status.can_advance_to(next) {
                    return Err(StateIntegrityFault::IllegalTransition {
                        request_id,
                        from: previous_status,
                        to: next,
                    });
                }
                next
            }
            _ => previous_status,
        };

        let next_progress = match update.progress_percentage {
            None => previous_progress,
            Some(received) => {
                let Some(progress) =
                    u8::try_from(received).ok().filter(|value| i64::from(*value) <= MAX_PROGRESS)
                else {
                    return Err(StateIntegrityFault::ProgressOutOfRange {
                        request_id,
                        received,
                    });
                };
                if progress < previous_progress {
                    return Err(StateIntegrityFault::ProgressRegression {
                        request_id,
                        current: previous_progress,
                        received,
                    });
                }
                progress
            }
        };

        let assign_reference = match (&update.npc_reference, self.request.npc_reference()) {
            (Some(received), Some(current)) if received != current => {
                return Err(StateIntegrityFault::NpcReferenceChanged {
                    request_id,
                    current: current.clone(),
                    received: received.clone(),
                });
            }
            (Some(received), None) => Some(received.clone()),
            _ => None,
        };

        self.request.set_status(next_status);
        self.request.set_progress(next_progress);
        let npc_reference_assigned = assign_reference.is_some();
        if let Some(reference) = assign_reference {
            self.request.set_npc_reference(reference);
        }
        Ok(TransitionOutcome {
            previous_status,
            status: next_status,
            previous_progress,
            progress: next_progress,
            npc_reference_assigned,
        })
    }
}
