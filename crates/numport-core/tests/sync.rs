// crates/numport-core/tests/sync.rs
// ============================================================================
// Module: Real-Time Sync Tests
// Description: Verifies event filtering, de-duplication, and subscriptions.
// ============================================================================

//! ## Overview
//! Drives the sync channel with hand-built change events and through the
//! in-memory backend's change feed, checking idempotence, user filtering, and
//! that releasing a subscription stops delivery.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::time::Duration;

use numport_core::ChangeEvent;
use numport_core::ChangeEventType;
use numport_core::CollectingNotifier;
use numport_core::Consents;
use numport_core::DigitalSignature;
use numport_core::EventDisposition;
use numport_core::Holder;
use numport_core::IgnoreReason;
use numport_core::InMemoryPortingBackend;
use numport_core::Network;
use numport_core::NpcReference;
use numport_core::PersistReceipt;
use numport_core::PersistRequest;
use numport_core::PortingApplication;
use numport_core::PortingBackend;
use numport_core::PortingStatus;
use numport_core::Priority;
use numport_core::RequestId;
use numport_core::RequestStateMachine;
use numport_core::SimType;
use numport_core::StateIntegrityFault;
use numport_core::SyncChannel;
use numport_core::SyncError;
use numport_core::Timestamp;
use numport_core::UserId;
use serde_json::json;

fn application(user: &str, phone: &str) -> PortingApplication {
    PortingApplication {
        user_id: UserId::new(user),
        phone_number: phone.to_string(),
        current_network: Network::Mtn,
        target_network: Network::Vodacom,
        holder: Holder {
            full_name: "John Doe".to_string(),
            id_number: "8001015009087".to_string(),
            date_of_birth: "1980-01-01".to_string(),
            contact_email: "john.doe@example.com".to_string(),
            contact_mobile: "082 123 4567".to_string(),
        },
        sim_type: SimType::Physical,
        priority: Priority::Normal,
        scheduled_cutover: None,
        documents: Vec::new(),
        consents: Consents {
            ownership: true,
            data_processing: true,
            marketing: false,
        },
        digital_signature: Some(DigitalSignature {
            signed_name: "John Doe".to_string(),
            signed_at: Timestamp::from_unix_millis(1_700_000_000_000),
        }),
    }
}

fn submitted(user: &str, id: &str, phone: &str) -> RequestStateMachine {
    let mut machine = RequestStateMachine::new(application(user, phone));
    let receipt = PersistReceipt {
        id: RequestId::new(id),
        status: PortingStatus::Submitted,
    };
    machine.mark_submitted(&receipt, Timestamp::from_unix_millis(1_700_000_000_000)).unwrap();
    machine
}

fn channel() -> (SyncChannel, Arc<CollectingNotifier>) {
    let notifier = Arc::new(CollectingNotifier::new());
    let channel = SyncChannel::new(UserId::new("user-1"), notifier.clone());
    channel.track(submitted("user-1", "req-1", "082 123 4567")).unwrap();
    (channel, notifier)
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0 .. 200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

#[test]
fn duplicate_events_apply_once() {
    let (channel, notifier) = channel();
    let event = ChangeEvent::update(
        None,
        json!({
            "id": "req-1",
            "user_id": "user-1",
            "status": "processing",
            "progress_percentage": 25
        }),
    );
    assert!(matches!(channel.handle_event(&event).unwrap(), EventDisposition::Applied { .. }));
    assert_eq!(channel.handle_event(&event).unwrap(), EventDisposition::Duplicate);

    let notifications = notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].previous, PortingStatus::Submitted);
    assert_eq!(notifications[0].current, PortingStatus::Processing);
    assert_eq!(
        notifications[0].message,
        "Your port request for 082 123 4567 is being processed"
    );
}

#[test]
fn sequenced_events_reject_replays() {
    let (channel, _) = channel();
    let row = |sequence: u64, progress: u8| {
        ChangeEvent::update(
            None,
            json!({
                "id": "req-1",
                "user_id": "user-1",
                "progress_percentage": progress,
                "sequence": sequence
            }),
        )
    };
    assert!(matches!(
        channel.handle_event(&row(2, 30)).unwrap(),
        EventDisposition::Applied { .. }
    ));
    assert_eq!(channel.handle_event(&row(2, 30)).unwrap(), EventDisposition::Duplicate);
    assert_eq!(
        channel.handle_event(&row(1, 10)).unwrap(),
        EventDisposition::Stale {
            sequence: 1,
            last_applied: 2,
        }
    );
    let request = channel.request(&RequestId::new("req-1")).unwrap().unwrap();
    assert_eq!(request.progress_percentage(), 30);
}

#[test]
fn foreign_and_irrelevant_events_are_ignored() {
    let (channel, notifier) = channel();
    let other_user = ChangeEvent::update(
        None,
        json!({"id": "req-1", "user_id": "user-2", "status": "completed"}),
    );
    assert_eq!(
        channel.handle_event(&other_user).unwrap(),
        EventDisposition::Ignored(IgnoreReason::OtherUser)
    );

    let unknown = ChangeEvent::update(
        None,
        json!({"id": "req-9", "user_id": "user-1", "status": "completed"}),
    );
    assert_eq!(
        channel.handle_event(&unknown).unwrap(),
        EventDisposition::Ignored(IgnoreReason::UnknownRequest)
    );

    let insert = ChangeEvent {
        event_type: ChangeEventType::Insert,
        table: "porting_requests".to_string(),
        old: None,
        new: Some(json!({"id": "req-1", "user_id": "user-1"})),
    };
    assert_eq!(
        channel.handle_event(&insert).unwrap(),
        EventDisposition::Ignored(IgnoreReason::NotAnUpdate)
    );

    let other_table = ChangeEvent {
        table: "profiles".to_string(),
        ..ChangeEvent::update(None, json!({"id": "req-1", "user_id": "user-1"}))
    };
    assert_eq!(
        channel.handle_event(&other_table).unwrap(),
        EventDisposition::Ignored(IgnoreReason::OtherTable)
    );

    let malformed = ChangeEvent::update(None, json!({"user_id": "user-1"}));
    assert!(matches!(channel.handle_event(&malformed).unwrap(), EventDisposition::Malformed(_)));

    assert!(notifier.notifications().is_empty());
    let request = channel.request(&RequestId::new("req-1")).unwrap().unwrap();
    assert_eq!(request.status(), PortingStatus::Submitted);
}

#[test]
fn integrity_faults_are_recorded_not_applied() {
    let (channel, notifier) = channel();
    let back = ChangeEvent::update(
        None,
        json!({"id": "req-1", "user_id": "user-1", "status": "draft"}),
    );
    assert!(matches!(channel.handle_event(&back).unwrap(), EventDisposition::Faulted(_)));
    assert!(matches!(
        channel.faults().unwrap().as_slice(),
        [StateIntegrityFault::IllegalTransition { .. }]
    ));
    assert!(notifier.notifications().is_empty());
}

#[test]
fn open_request_lookup_ignores_terminal_requests() {
    let (channel, _) = channel();
    assert_eq!(
        channel.open_request_for("082 123 4567").unwrap(),
        Some(RequestId::new("req-1"))
    );
    let completed = ChangeEvent::update(
        None,
        json!({"id": "req-1", "user_id": "user-1", "status": "completed"}),
    );
    channel.handle_event(&completed).unwrap();
    assert_eq!(channel.open_request_for("082 123 4567").unwrap(), None);
}

#[test]
fn ledger_refuses_foreign_requests() {
    let (channel, _) = channel();
    assert!(!channel.track(submitted("user-2", "req-2", "083 000 0000")).unwrap());
    let machine = RequestStateMachine::new(application("user-1", "084 000 0000"));
    assert!(!channel.track(machine).unwrap());
    assert_eq!(channel.requests().unwrap().len(), 1);
}

#[tokio::test]
async fn subscription_applies_feed_events_until_released() {
    let backend = InMemoryPortingBackend::new();
    let receipt = backend
        .insert_request(&PersistRequest::from_application(&application("user-1", "082 123 4567")))
        .await
        .unwrap();
    let notifier = Arc::new(CollectingNotifier::new());
    let channel = SyncChannel::new(UserId::new("user-1"), notifier.clone());
    let rows = backend.list_requests(&UserId::new("user-1")).await.unwrap();
    let loaded = channel.load(rows).unwrap();
    assert_eq!(loaded, 1);

    let subscription = channel.subscribe(&backend, &UserId::new("user-1")).unwrap();
    assert!(subscription.is_active());
    assert_eq!(backend.subscriber_count(), 1);

    backend
        .publish_update(
            &receipt.id,
            Some(PortingStatus::Processing),
            Some(50),
            Some(NpcReference::new("NPC-7")),
        )
        .unwrap();
    wait_for(|| notifier.notifications().len() == 1).await;

    let report = subscription.unsubscribe().await;
    assert_eq!(report.received, 1);
    assert_eq!(report.applied, 1);
    assert!(!report.feed_closed);

    backend.publish_update(&receipt.id, Some(PortingStatus::Completed), Some(100), None).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(notifier.notifications().len(), 1);
    assert_eq!(backend.subscriber_count(), 0);

    let request = channel.request(&receipt.id).unwrap().unwrap();
    assert_eq!(request.status(), PortingStatus::Processing);
    assert_eq!(request.npc_reference(), Some(&NpcReference::new("NPC-7")));
}

#[tokio::test]
async fn subscription_requires_ledger_owner() {
    let backend = InMemoryPortingBackend::new();
    let channel = SyncChannel::new(UserId::new("user-1"), Arc::new(CollectingNotifier::new()));
    let result = channel.subscribe(&backend, &UserId::new("user-2"));
    assert!(matches!(result, Err(SyncError::UserMismatch { .. })));
}

#[tokio::test]
async fn other_users_feed_events_are_not_delivered() {
    let backend = InMemoryPortingBackend::new();
    let foreign = backend
        .insert_request(&PersistRequest::from_application(&application("user-2", "083 111 2222")))
        .await
        .unwrap();
    let notifier = Arc::new(CollectingNotifier::new());
    let channel = SyncChannel::new(UserId::new("user-1"), notifier.clone());
    let subscription = channel.subscribe(&backend, &UserId::new("user-1")).unwrap();
    backend.publish_update(&foreign.id, Some(PortingStatus::Processing), None, None).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let report = subscription.unsubscribe().await;
    assert_eq!(report.received, 0);
    assert!(notifier.notifications().is_empty());
}
