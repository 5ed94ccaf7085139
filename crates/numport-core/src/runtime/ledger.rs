// crates/numport-core/src/runtime/ledger.rs
// ============================================================================
// Module: Numport Request Ledger
// Description: Local list of one user's porting requests and event bookkeeping.
// Purpose: Route change events to the right state machine exactly once.
// Dependencies: crate::{core, runtime::machine}, tracing
// ============================================================================

//! ## Overview
//! The ledger holds the signed-in user's submitted requests keyed by request
//! id. Change events are filtered (only `UPDATE` rows on the porting table
//! owned by the user), de-duplicated, and handed to the owning
//! [`RequestStateMachine`]. Sequenced events are ordered by the highest
//! sequence applied per request; unsequenced events are de-duplicated by a
//! fingerprint of their canonical row.
//!
//! ## Invariants
//! - Applying the same event twice leaves the same state as applying it once.
//! - Integrity faults are recorded and logged; the affected request is unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::core::ChangeEvent;
use crate::core::ChangeEventType;
use crate::core::Fingerprint;
use crate::core::PortingRequest;
use crate::core::RemoteUpdate;
use crate::core::RequestId;
use crate::core::UserId;
use crate::core::hashing::fingerprint_json;
use crate::runtime::machine::RequestStateMachine;
use crate::runtime::machine::StateIntegrityFault;
use crate::runtime::machine::TransitionOutcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fingerprints remembered for de-duplication.
const MAX_SEEN_FINGERPRINTS: usize = 4_096;
/// Integrity faults retained for inspection.
const MAX_RECORDED_FAULTS: usize = 256;

// ============================================================================
// SECTION: Dispositions
// ============================================================================

/// Why an event was ignored without touching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// `INSERT` or `DELETE` event.
    NotAnUpdate,
    /// Row belongs to another table.
    OtherTable,
    /// Row belongs to another user.
    OtherUser,
    /// Row names a request the ledger does not track.
    UnknownRequest,
}

/// What the ledger did with one change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDisposition {
    /// The event was filtered out.
    Ignored(IgnoreReason),
    /// The event was already applied.
    Duplicate,
    /// The event's sequence is not newer than the last applied one.
    Stale {
        /// Sequence carried by the event.
        sequence: u64,
        /// Highest sequence already applied.
        last_applied: u64,
    },
    /// The event row could not be decoded.
    Malformed(String),
    /// The event was rejected as an integrity fault.
    Faulted(StateIntegrityFault),
    /// The event was applied.
    Applied {
        /// Request updated.
        request_id: RequestId,
        /// Effect of the update.
        outcome: TransitionOutcome,
    },
}

/// Tracks the seen-fingerprint window.
#[derive(Debug, Default)]
struct SeenWindow {
    /// Fingerprints in arrival order.
    order: VecDeque<Fingerprint>,
    /// Fingerprint membership.
    members: HashSet<Fingerprint>,
}

impl SeenWindow {
    /// Returns true when `fingerprint` is in the window.
    fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.members.contains(fingerprint)
    }

    /// Adds `fingerprint`, evicting the oldest entry when full.
    fn insert(&mut self, fingerprint: Fingerprint) {
        if !self.members.insert(fingerprint.clone()) {
            return;
        }
        self.order.push_back(fingerprint);
        if self.order.len() > MAX_SEEN_FINGERPRINTS
            && let Some(evicted) = self.order.pop_front()
        {
            self.members.remove(&evicted);
        }
    }
}

// ============================================================================
// SECTION: Ledger
// ============================================================================

/// One user's porting requests plus event bookkeeping.
#[derive(Debug)]
pub struct RequestLedger {
    /// Owner of every tracked request.
    user_id: UserId,
    /// State machines keyed by request id.
    machines: BTreeMap<RequestId, RequestStateMachine>,
    /// Highest sequence applied per request.
    last_sequence: BTreeMap<RequestId, u64>,
    /// Fingerprints of applied unsequenced rows.
    seen: SeenWindow,
    /// Recently recorded integrity faults, oldest first.
    faults: VecDeque<StateIntegrityFault>,
}

impl RequestLedger {
    /// Creates an empty ledger for `user_id`.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            machines: BTreeMap::new(),
            last_sequence: BTreeMap::new(),
            seen: SeenWindow::default(),
            faults: VecDeque::new(),
        }
    }

    /// Returns the ledger owner.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Tracks a submitted request.
    ///
    /// Returns false when the request has no id or belongs to another user.
    pub fn track(&mut self, machine: RequestStateMachine) -> bool {
        if machine.request().user_id() != &self.user_id {
            return false;
        }
        let Some(id) = machine.request().id().cloned() else {
            return false;
        };
        self.machines.insert(id, machine);
        true
    }

    /// Tracks requests listed by the backend, skipping drafts and other users' rows.
    ///
    /// Returns the number of requests tracked.
    pub fn load(&mut self, requests: Vec<PortingRequest>) -> usize {
        let mut tracked = 0;
        for request in requests {
            if self.track(RequestStateMachine::from_request(request)) {
                tracked += 1;
            }
        }
        tracked
    }

    /// Returns the tracked request with `id`.
    #[must_use]
    pub fn get(&self, id: &RequestId) -> Option<&PortingRequest> {
        self.machines.get(id).map(RequestStateMachine::request)
    }

    /// Returns every tracked request ordered by id.
    #[must_use]
    pub fn requests(&self) -> Vec<PortingRequest> {
        self.machines.values().map(|machine| machine.request().clone()).collect()
    }

    /// Returns the number of tracked requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.machines.len()
    }

    /// Returns true when no requests are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Returns the open (submitted, not terminal) request for `phone_number`.
    #[must_use]
    pub fn open_request_for(&self, phone_number: &str) -> Option<&PortingRequest> {
        self.machines.values().map(RequestStateMachine::request).find(|request| {
            request.phone_number() == phone_number && !request.status().is_terminal()
        })
    }

    /// Returns recently recorded integrity faults, oldest first.
    #[must_use]
    pub fn faults(&self) -> Vec<StateIntegrityFault> {
        self.faults.iter().cloned().collect()
    }

    /// Applies one change event.
    pub fn apply_event(&mut self, event: &ChangeEvent) -> EventDisposition {
        if event.event_type != ChangeEventType::Update {
            return EventDisposition::Ignored(IgnoreReason::NotAnUpdate);
        }
        if !event.is_porting_row() {
            return EventDisposition::Ignored(IgnoreReason::OtherTable);
        }
        let update = match RemoteUpdate::from_event(event) {
            Ok(update) => update,
            Err(err) => {
                warn!(error = %err, "change event rejected");
                return EventDisposition::Malformed(err.to_string());
            }
        };
        if update.user_id != self.user_id {
            return EventDisposition::Ignored(IgnoreReason::OtherUser);
        }
        if !self.machines.contains_key(&update.request_id) {
            debug!(request_id = %update.request_id, "change event for untracked request");
            return EventDisposition::Ignored(IgnoreReason::UnknownRequest);
        }

        let fingerprint = match update.sequence {
            Some(sequence) => {
                if let Some(&last_applied) = self.last_sequence.get(&update.request_id)
                    && sequence <= last_applied
                {
                    return if sequence == last_applied {
                        EventDisposition::Duplicate
                    } else {
                        EventDisposition::Stale {
                            sequence,
                            last_applied,
                        }
                    };
                }
                None
            }
            None => match fingerprint_json(&event.new) {
                Ok(fingerprint) if self.seen.contains(&fingerprint) => {
                    return EventDisposition::Duplicate;
                }
                Ok(fingerprint) => Some(fingerprint),
                Err(err) => return EventDisposition::Malformed(err.to_string()),
            },
        };

        let Some(machine) = self.machines.get_mut(&update.request_id) else {
            return EventDisposition::Ignored(IgnoreReason::UnknownRequest);
        };
        match machine.apply_remote(&update) {
            Ok(outcome) => {
                if let Some(sequence) = update.sequence {
                    self.last_sequence.insert(update.request_id.clone(), sequence);
                }
                if let Some(fingerprint) = fingerprint {
                    self.seen.insert(fingerprint);
                }
                debug!(
                    request_id = %update.request_id,
                    status = outcome.status.as_str(),
                    progress = outcome.progress,
                    "remote update applied"
                );
                EventDisposition::Applied {
                    request_id: update.request_id,
                    outcome,
                }
            }
            Err(fault) => {
                warn!(request_id = %update.request_id, fault = %fault, "state integrity fault");
                if self.faults.len() >= MAX_RECORDED_FAULTS {
                    self.faults.pop_front();
                }
                self.faults.push_back(fault.clone());
                EventDisposition::Faulted(fault)
            }
        }
    }
}
