//! Contract Test: Subscriber Lifecycle
//!
//! Verifies the signup state machine end to end over a real store:
//! - a new address creates one record and one confirmation
//! - an active address is a no-op with zero confirmations
//! - a removed address is restored in place with one confirmation
//!
//! If this test fails, signups can double-notify or duplicate records.

mod common;

use common::*;
use listsync_core::traits::{DispatchReason, SubscriberStore};
use listsync_core::{
    Error, FileSubscriberStore, MemorySubscriberStore, SignupOutcome, SubscriberEmail,
    SubscriberLifecycle,
};
use tokio_test::assert_ok;

fn lifecycle() -> (SubscriberLifecycle, MemorySubscriberStore, RecordingDispatcher) {
    // Clones share the same records
    let store = MemorySubscriberStore::new();
    let dispatcher = RecordingDispatcher::new();
    let lifecycle = SubscriberLifecycle::new(
        Box::new(store.clone()),
        Box::new(RecordingDispatcher::sharing_counters_with(&dispatcher)),
    );
    (lifecycle, store, dispatcher)
}

#[tokio::test]
async fn new_address_creates_one_record_and_one_dispatch() {
    let (lifecycle, store, dispatcher) = lifecycle();

    for address in ["a@example.com", "b@example.com", "c@example.com"] {
        let outcome = assert_ok!(lifecycle.handle_signup(address).await);
        assert!(matches!(outcome, SignupOutcome::Created(_)));
    }

    assert_eq!(store.count_with_removed().await.unwrap(), 3);
    assert_eq!(dispatcher.dispatch_count(), 3);
    assert!(
        dispatcher
            .jobs()
            .iter()
            .all(|job| job.reason == DispatchReason::Created)
    );
}

#[tokio::test]
async fn active_address_is_a_silent_noop() {
    let (lifecycle, store, dispatcher) = lifecycle();

    lifecycle.handle_signup("a@example.com").await.unwrap();
    let before = store
        .find_with_removed(&SubscriberEmail::parse("a@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();

    for variant in ["a@example.com", "A@EXAMPLE.COM", "  a@example.com  "] {
        let outcome = assert_ok!(lifecycle.handle_signup(variant).await);
        assert!(matches!(outcome, SignupOutcome::AlreadyActive(_)));
    }

    let after = store
        .find_with_removed(&SubscriberEmail::parse("a@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();

    // No mutation at all, not even a timestamp
    assert_eq!(before, after);
    assert_eq!(store.count_with_removed().await.unwrap(), 1);
    assert_eq!(dispatcher.dispatch_count(), 1);
}

#[tokio::test]
async fn removed_address_is_restored_with_same_identity() {
    let (lifecycle, store, dispatcher) = lifecycle();

    let created = lifecycle.handle_signup("a@example.com").await.unwrap();
    assert!(lifecycle.handle_removal("a@example.com").await.unwrap());
    assert!(store.list_active().await.unwrap().is_empty());

    let restored = lifecycle.handle_signup("a@example.com").await.unwrap();
    let SignupOutcome::Restored(record) = &restored else {
        panic!("expected a restore, got {:?}", restored);
    };

    assert_eq!(record.id, created.subscriber().id);
    assert!(record.deleted_at.is_none());
    assert_eq!(store.count_with_removed().await.unwrap(), 1);

    let jobs = dispatcher.jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[1].reason, DispatchReason::Restored);
    assert_eq!(jobs[1].subscriber.id, record.id);
}

#[tokio::test]
async fn signup_remove_signup_scenario_dispatches_twice() {
    let (lifecycle, store, dispatcher) = lifecycle();

    // Signup
    let first = lifecycle.handle_signup("new@example.com").await.unwrap();
    assert!(matches!(first, SignupOutcome::Created(_)));
    assert_eq!(dispatcher.dispatch_count(), 1);

    // Immediate re-signup
    let second = lifecycle.handle_signup("new@example.com").await.unwrap();
    assert!(matches!(second, SignupOutcome::AlreadyActive(_)));
    assert_eq!(store.count_with_removed().await.unwrap(), 1);
    assert_eq!(dispatcher.dispatch_count(), 1);

    // Soft-remove, then signup again
    lifecycle.handle_removal("new@example.com").await.unwrap();
    let third = lifecycle.handle_signup("new@example.com").await.unwrap();
    assert!(matches!(third, SignupOutcome::Restored(_)));
    assert_eq!(third.subscriber().id, first.subscriber().id);

    assert_eq!(dispatcher.dispatch_count(), 2);
}

#[tokio::test]
async fn removal_is_idempotent() {
    let (lifecycle, _store, dispatcher) = lifecycle();

    lifecycle.handle_signup("a@example.com").await.unwrap();
    assert!(lifecycle.handle_removal("a@example.com").await.unwrap());
    assert!(!lifecycle.handle_removal("a@example.com").await.unwrap());

    // Removal never notifies
    assert_eq!(dispatcher.dispatch_count(), 1);
}

#[tokio::test]
async fn invalid_address_touches_nothing() {
    let (lifecycle, store, dispatcher) = lifecycle();

    let err = lifecycle.handle_signup("definitely not an email").await.unwrap_err();
    assert!(matches!(err, Error::InvalidEmail(_)));
    assert_eq!(store.count_with_removed().await.unwrap(), 0);
    assert_eq!(dispatcher.dispatch_count(), 0);
}

#[tokio::test]
async fn lifecycle_state_survives_restart_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subscribers.json");
    let dispatcher = RecordingDispatcher::new();

    let first_id = {
        let lifecycle = SubscriberLifecycle::new(
            Box::new(FileSubscriberStore::new(&path).await.unwrap()),
            Box::new(RecordingDispatcher::sharing_counters_with(&dispatcher)),
        );
        let outcome = lifecycle.handle_signup("a@example.com").await.unwrap();
        lifecycle.handle_removal("a@example.com").await.unwrap();
        outcome.subscriber().id
    };

    let lifecycle = SubscriberLifecycle::new(
        Box::new(FileSubscriberStore::new(&path).await.unwrap()),
        Box::new(RecordingDispatcher::sharing_counters_with(&dispatcher)),
    );
    let outcome = lifecycle.handle_signup("a@example.com").await.unwrap();

    assert!(matches!(outcome, SignupOutcome::Restored(_)));
    assert_eq!(outcome.subscriber().id, first_id);
    assert_eq!(dispatcher.dispatch_count(), 2);
}
