// crates/numport-core/src/runtime/sync.rs
// ============================================================================
// Module: Numport Real-Time Sync Channel
// Description: Change-feed subscription, event application, and notifications.
// Purpose: Keep the local request list in step with the backend.
// Dependencies: crate::{core, interfaces, runtime::ledger}, tokio, tracing
// ============================================================================

//! ## Overview
//! The [`SyncChannel`] owns the shared [`RequestLedger`]. A [`Subscription`]
//! spawns a task that drains the change feed into the ledger and raises a
//! [`StatusNotification`] whenever an applied event changes a request's
//! status. Releasing the subscription (explicitly or by dropping it) is the
//! only cancellation point; the feed receiver is closed with the task.
//!
//! Events for one request are applied in delivery order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;

use crate::core::ChangeEvent;
use crate::core::PortingRequest;
use crate::core::PortingStatus;
use crate::core::RequestId;
use crate::core::UserId;
use crate::interfaces::ChangeFeed;
use crate::interfaces::FeedError;
use crate::interfaces::Notifier;
use crate::interfaces::StatusNotification;
use crate::runtime::ledger::EventDisposition;
use crate::runtime::ledger::RequestLedger;
use crate::runtime::machine::RequestStateMachine;
use crate::runtime::machine::StateIntegrityFault;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default change-feed buffer size.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Sync channel errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The ledger mutex was poisoned.
    #[error("request ledger mutex poisoned")]
    Poisoned,
    /// The subscription targets a different user than the ledger.
    #[error("subscription for {requested} does not match ledger owner {owner}")]
    UserMismatch {
        /// Ledger owner.
        owner: UserId,
        /// Requested user.
        requested: UserId,
    },
    /// The change feed refused the subscription.
    #[error(transparent)]
    Feed(#[from] FeedError),
}

// ============================================================================
// SECTION: Sync Channel
// ============================================================================

/// Shared ledger plus notification fan-out.
#[derive(Clone)]
pub struct SyncChannel {
    /// Ledger shared with the subscription task.
    ledger: Arc<Mutex<RequestLedger>>,
    /// Receiver of status notifications.
    notifier: Arc<dyn Notifier>,
    /// Change-feed buffer size.
    capacity: usize,
}

impl SyncChannel {
    /// Creates a channel with an empty ledger for `user_id`.
    #[must_use]
    pub fn new(user_id: UserId, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(RequestLedger::new(user_id))),
            notifier,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Overrides the change-feed buffer size.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Locks the ledger.
    fn lock(&self) -> Result<MutexGuard<'_, RequestLedger>, SyncError> {
        self.ledger.lock().map_err(|_| SyncError::Poisoned)
    }

    /// Returns the ledger owner.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Poisoned`] when the ledger is unavailable.
    pub fn user_id(&self) -> Result<UserId, SyncError> {
        Ok(self.lock()?.user_id().clone())
    }

    /// Tracks a submitted request.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Poisoned`] when the ledger is unavailable.
    pub fn track(&self, machine: RequestStateMachine) -> Result<bool, SyncError> {
        Ok(self.lock()?.track(machine))
    }

    /// Tracks requests listed by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Poisoned`] when the ledger is unavailable.
    pub fn load(&self, requests: Vec<PortingRequest>) -> Result<usize, SyncError> {
        Ok(self.lock()?.load(requests))
    }

    /// Returns a snapshot of every tracked request.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Poisoned`] when the ledger is unavailable.
    pub fn requests(&self) -> Result<Vec<PortingRequest>, SyncError> {
        Ok(self.lock()?.requests())
    }

    /// Returns a snapshot of one tracked request.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Poisoned`] when the ledger is unavailable.
    pub fn request(&self, id: &RequestId) -> Result<Option<PortingRequest>, SyncError> {
        Ok(self.lock()?.get(id).cloned())
    }

    /// Returns the open request for `phone_number`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Poisoned`] when the ledger is unavailable.
    pub fn open_request_for(&self, phone_number: &str) -> Result<Option<RequestId>, SyncError> {
        Ok(self.lock()?.open_request_for(phone_number).and_then(|request| request.id().cloned()))
    }

    /// Returns recently recorded integrity faults.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Poisoned`] when the ledger is unavailable.
    pub fn faults(&self) -> Result<Vec<StateIntegrityFault>, SyncError> {
        Ok(self.lock()?.faults())
    }

    /// Applies one change event and notifies on status transitions.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Poisoned`] when the ledger is unavailable.
    pub fn handle_event(&self, event: &ChangeEvent) -> Result<EventDisposition, SyncError> {
        let (disposition, notification) = {
            let mut ledger = self.lock()?;
            let disposition = ledger.apply_event(event);
            let notification = match &disposition {
                EventDisposition::Applied {
                    request_id,
                    outcome,
                } if outcome.status_changed() => {
                    ledger.get(request_id).map(|request| StatusNotification {
                        request_id: request_id.clone(),
                        phone_number: request.phone_number().to_string(),
                        previous: outcome.previous_status,
                        current: outcome.status,
                        message: status_message(request.phone_number(), outcome.status),
                    })
                }
                _ => None,
            };
            (disposition, notification)
        };
        if let Some(notification) = notification {
            self.notifier.notify(&notification);
        }
        Ok(disposition)
    }

    /// Subscribes to `feed` for `user_id` and applies events until released.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when `user_id` does not own the ledger or the feed
    /// refuses the subscription.
    pub fn subscribe(
        &self,
        feed: &dyn ChangeFeed,
        user_id: &UserId,
    ) -> Result<Subscription, SyncError> {
        let owner = self.user_id()?;
        if &owner != user_id {
            return Err(SyncError::UserMismatch {
                owner,
                requested: user_id.clone(),
            });
        }
        let mut receiver = feed.subscribe(user_id, self.capacity)?;
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let channel = self.clone();
        info!(user_id = %user_id, "change feed subscribed");
        let handle = tokio::spawn(async move {
            let mut report = SubscriptionReport::default();
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    event = receiver.recv() => {
                        let Some(event) = event else {
                            report.feed_closed = true;
                            break;
                        };
                        report.received += 1;
                        match channel.handle_event(&event) {
                            Ok(EventDisposition::Applied { .. }) => report.applied += 1,
                            Ok(disposition) => {
                                debug!(disposition = ?disposition, "change event not applied");
                            }
                            Err(_) => {
                                report.errors += 1;
                                break;
                            }
                        }
                    }
                }
            }
            receiver.close();
            report
        });
        Ok(Subscription {
            cancel: Some(cancel_tx),
            handle: Some(handle),
        })
    }
}

/// Builds the user-facing message for a status transition.
fn status_message(phone_number: &str, status: PortingStatus) -> String {
    match status {
        PortingStatus::Draft | PortingStatus::Submitted => {
            format!("Your port request for {phone_number} has been received")
        }
        PortingStatus::Processing => {
            format!("Your port request for {phone_number} is being processed")
        }
        PortingStatus::Completed => format!("Your number {phone_number} has been ported"),
        PortingStatus::Rejected => format!("Your port request for {phone_number} was rejected"),
    }
}

// ============================================================================
// SECTION: Subscription
// ============================================================================

/// Counters reported when a subscription ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionReport {
    /// Events received from the feed.
    pub received: u64,
    /// Events applied to the ledger.
    pub applied: u64,
    /// Ledger failures that stopped the subscription.
    pub errors: u64,
    /// Whether the feed closed before release.
    pub feed_closed: bool,
}

/// Live change-feed subscription.
///
/// Dropping the subscription releases it.
#[derive(Debug)]
pub struct Subscription {
    /// Cancellation signal for the drain task.
    cancel: Option<oneshot::Sender<()>>,
    /// Drain task.
    handle: Option<JoinHandle<SubscriptionReport>>,
}

impl Subscription {
    /// Returns true while the drain task is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Releases the subscription and waits for the drain task to stop.
    pub async fn unsubscribe(mut self) -> SubscriptionReport {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        let report = match self.handle.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => SubscriptionReport::default(),
        };
        info!(received = report.received, applied = report.applied, "change feed unsubscribed");
        report
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

// ============================================================================
// SECTION: Notifiers
// ============================================================================

/// Notifier that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &StatusNotification) {
        info!(
            request_id = %notification.request_id,
            previous = notification.previous.as_str(),
            current = notification.current.as_str(),
            "{}",
            notification.message
        );
    }
}

/// Notifier that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    /// Delivered notifications, in order.
    delivered: Mutex<Vec<StatusNotification>>,
}

impl CollectingNotifier {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the delivered notifications.
    #[must_use]
    pub fn notifications(&self) -> Vec<StatusNotification> {
        self.delivered.lock().map(|delivered| delivered.clone()).unwrap_or_default()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: &StatusNotification) {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(notification.clone());
        }
    }
}
