// crates/numport-core/src/runtime/memory.rs
// ============================================================================
// Module: Numport In-Memory Collaborators
// Description: In-memory backend, change feed, and document verifier.
// Purpose: Provide deterministic collaborators for tests and local demos.
// Dependencies: crate::{core, interfaces}, async-trait, tokio, serde_json
// ============================================================================

//! ## Overview
//! [`InMemoryPortingBackend`] persists requests in a map, assigns `req-N`
//! identifiers, and fans change events out to subscribers filtered by user.
//! Failures can be queued to exercise retry paths. [`StaticDocumentVerifier`]
//! returns a fixed report. Neither is intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use serde_json::Value;
use serde_json::json;
use tokio::sync::mpsc;

use crate::core::ChangeEvent;
use crate::core::Clock;
use crate::core::FileUpload;
use crate::core::NpcReference;
use crate::core::PortingRequest;
use crate::core::PortingStatus;
use crate::core::RequestId;
use crate::core::SystemClock;
use crate::core::Timestamp;
use crate::core::UserId;
use crate::core::VerificationReport;
use crate::interfaces::BackendError;
use crate::interfaces::ChangeFeed;
use crate::interfaces::DocumentVerifier;
use crate::interfaces::FeedError;
use crate::interfaces::PersistReceipt;
use crate::interfaces::PersistRequest;
use crate::interfaces::PortingBackend;
use crate::interfaces::VerificationError;

// ============================================================================
// SECTION: Backend State
// ============================================================================

/// Stored porting row.
#[derive(Debug, Clone)]
struct StoredRow {
    /// Persisted payload.
    payload: PersistRequest,
    /// Current status.
    status: PortingStatus,
    /// Current progress.
    progress_percentage: u8,
    /// Clearinghouse reference.
    npc_reference: Option<NpcReference>,
    /// Emission sequence of the last change.
    sequence: u64,
    /// Time the row was inserted.
    created_at: Timestamp,
}

impl StoredRow {
    /// Renders the row as the change feed presents it.
    fn to_json(&self, id: &RequestId) -> Value {
        json!({
            "id": id.as_str(),
            "user_id": self.payload.user_id.as_str(),
            "phone_number": self.payload.phone_number,
            "status": self.status.as_str(),
            "progress_percentage": self.progress_percentage,
            "npc_reference": self.npc_reference.as_ref().map(NpcReference::as_str),
            "sequence": self.sequence,
        })
    }
}

/// Mutable backend state.
#[derive(Debug, Default)]
struct BackendState {
    /// Last assigned request number.
    next_id: u64,
    /// Last emitted sequence.
    sequence: u64,
    /// Stored rows.
    rows: BTreeMap<RequestId, StoredRow>,
    /// Failures returned by upcoming insert calls.
    queued_failures: VecDeque<BackendError>,
    /// Insert calls observed.
    insert_calls: u64,
    /// Feed subscribers.
    subscribers: Vec<(UserId, mpsc::Sender<ChangeEvent>)>,
}

// ============================================================================
// SECTION: In-Memory Backend
// ============================================================================

/// In-memory porting backend and change feed.
#[derive(Clone)]
pub struct InMemoryPortingBackend {
    /// Shared state.
    state: Arc<Mutex<BackendState>>,
    /// Time source for insert timestamps.
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryPortingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPortingBackend {
    /// Creates an empty backend on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty backend on `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BackendState::default())),
            clock,
        }
    }

    /// Locks the backend state.
    fn lock(&self) -> Result<MutexGuard<'_, BackendState>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::Unavailable("in-memory backend mutex poisoned".to_string()))
    }

    /// Queues `error` for the next insert call.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the backend state is unavailable.
    pub fn fail_next_insert(&self, error: BackendError) -> Result<(), BackendError> {
        self.lock()?.queued_failures.push_back(error);
        Ok(())
    }

    /// Returns the number of insert calls observed.
    #[must_use]
    pub fn insert_calls(&self) -> u64 {
        self.lock().map(|state| state.insert_calls).unwrap_or_default()
    }

    /// Applies a backend-side change to a stored row and publishes an `UPDATE`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] when the request is unknown.
    pub fn publish_update(
        &self,
        id: &RequestId,
        status: Option<PortingStatus>,
        progress_percentage: Option<u8>,
        npc_reference: Option<NpcReference>,
    ) -> Result<ChangeEvent, BackendError> {
        let mut state = self.lock()?;
        state.sequence += 1;
        let sequence = state.sequence;
        let row = state
            .rows
            .get_mut(id)
            .ok_or_else(|| BackendError::Rejected(format!("unknown request {id}")))?;
        let old = row.to_json(id);
        if let Some(status) = status {
            row.status = status;
        }
        if let Some(progress) = progress_percentage {
            row.progress_percentage = progress;
        }
        if let Some(reference) = npc_reference {
            row.npc_reference = Some(reference);
        }
        row.sequence = sequence;
        let event = ChangeEvent::update(Some(old), row.to_json(id));
        let owner = row.payload.user_id.clone();
        Self::fan_out(&mut state, &owner, &event);
        Ok(event)
    }

    /// Delivers a raw event to subscribers of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the backend state is unavailable.
    pub fn deliver(&self, user_id: &UserId, event: &ChangeEvent) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        Self::fan_out(&mut state, user_id, event);
        Ok(())
    }

    /// Sends `event` to live subscribers of `user_id`, pruning closed ones.
    fn fan_out(state: &mut BackendState, user_id: &UserId, event: &ChangeEvent) {
        state.subscribers.retain(|(_, sender)| !sender.is_closed());
        for (subscriber, sender) in &state.subscribers {
            if subscriber == user_id {
                let _ = sender.try_send(event.clone());
            }
        }
    }

    /// Returns the number of live feed subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .map(|state| state.subscribers.iter().filter(|(_, sender)| !sender.is_closed()).count())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PortingBackend for InMemoryPortingBackend {
    async fn insert_request(
        &self,
        request: &PersistRequest,
    ) -> Result<PersistReceipt, BackendError> {
        let mut state = self.lock()?;
        state.insert_calls += 1;
        if let Some(error) = state.queued_failures.pop_front() {
            return Err(error);
        }
        state.next_id += 1;
        let id = RequestId::new(format!("req-{}", state.next_id));
        state.rows.insert(
            id.clone(),
            StoredRow {
                payload: request.clone(),
                status: PortingStatus::Submitted,
                progress_percentage: 0,
                npc_reference: None,
                sequence: 0,
                created_at: self.clock.now(),
            },
        );
        Ok(PersistReceipt {
            id,
            status: PortingStatus::Submitted,
        })
    }

    async fn list_requests(&self, user_id: &UserId) -> Result<Vec<PortingRequest>, BackendError> {
        let state = self.lock()?;
        let requests = state
            .rows
            .iter()
            .filter(|(_, row)| &row.payload.user_id == user_id)
            .map(|(id, row)| {
                PortingRequest::restore(
                    id.clone(),
                    row.payload.to_application(),
                    row.status,
                    row.progress_percentage,
                    row.npc_reference.clone(),
                    row.created_at,
                )
            })
            .collect();
        Ok(requests)
    }
}

impl ChangeFeed for InMemoryPortingBackend {
    fn subscribe(
        &self,
        user_id: &UserId,
        capacity: usize,
    ) -> Result<mpsc::Receiver<ChangeEvent>, FeedError> {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        self.state
            .lock()
            .map_err(|_| FeedError::Subscribe("in-memory backend mutex poisoned".to_string()))?
            .subscribers
            .push((user_id.clone(), sender));
        Ok(receiver)
    }
}

// ============================================================================
// SECTION: Static Verifier
// ============================================================================

/// Document verifier returning a fixed report.
#[derive(Debug)]
pub struct StaticDocumentVerifier {
    /// Report returned on success.
    report: VerificationReport,
    /// Failures returned by upcoming calls.
    queued_failures: Mutex<VecDeque<VerificationError>>,
    /// Calls observed.
    calls: AtomicU64,
}

impl StaticDocumentVerifier {
    /// Creates a verifier returning `report`.
    #[must_use]
    pub fn new(report: VerificationReport) -> Self {
        Self {
            report,
            queued_failures: Mutex::new(VecDeque::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// Queues `error` for the next call.
    pub fn fail_next(&self, error: VerificationError) {
        if let Ok(mut queue) = self.queued_failures.lock() {
            queue.push_back(error);
        }
    }

    /// Returns the number of calls observed.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StaticDocumentVerifier {
    fn default() -> Self {
        Self::new(VerificationReport {
            authenticity_percent: 97.5,
            fraud_score: 0.02,
            extracted_fields: BTreeMap::new(),
        })
    }
}

#[async_trait]
impl DocumentVerifier for StaticDocumentVerifier {
    async fn verify(&self, _file: &FileUpload) -> Result<VerificationReport, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let queued = self
            .queued_failures
            .lock()
            .map_err(|_| VerificationError::Unavailable("verifier mutex poisoned".to_string()))?
            .pop_front();
        match queued {
            Some(error) => Err(error),
            None => Ok(self.report.clone()),
        }
    }
}
