// Sync promise integration tests
//
// A sync dispatch folds locally and stays pending until the server either
// confirms the entry or undoes it.

mod common;

use common::{add, new_log, open_store};
use foldlog_engine::{EventLog, StoreConfig, SyncRejected};
use foldlog_types::{tag, Action, MetaDraft};
use tokio::sync::oneshot::error::TryRecvError;

#[tokio::test]
async fn confirmation_resolves_only_its_own_dispatch() {
    let store = open_store(new_log(), StoreConfig::default()).await;
    let mut first = store
        .dispatch_sync(add("a"), MetaDraft::new())
        .await
        .unwrap();
    let second = store
        .dispatch_sync(add("b"), MetaDraft::new())
        .await
        .unwrap();
    assert_eq!(store.state().value, "0ab");

    // The server confirms the second entry before the first.
    store
        .dispatch_cross_tab(Action::processed(&second.meta.id), MetaDraft::new())
        .await
        .unwrap();

    let mut second_done = tokio_test::task::spawn(second.done);
    match second_done.poll() {
        std::task::Poll::Ready(outcome) => assert_eq!(outcome.unwrap(), Ok(())),
        std::task::Poll::Pending => panic!("confirmed dispatch must be settled"),
    }
    assert!(matches!(first.done.try_recv(), Err(TryRecvError::Empty)));
    // Confirmation is a control entry: the state is untouched.
    assert_eq!(store.state().value, "0ab");
}

#[tokio::test]
async fn undo_rejects_the_pending_dispatch() {
    let log = new_log();
    let store = open_store(log.clone(), StoreConfig::default()).await;
    let mut ticket = store
        .dispatch_sync(add("a"), MetaDraft::new())
        .await
        .unwrap();
    assert_eq!(store.state().value, "0a");

    store
        .dispatch_cross_tab(
            Action::undo(&ticket.meta.id, "denied", add("a")),
            MetaDraft::new().with_reason("test"),
        )
        .await
        .unwrap();

    let outcome = ticket.done.try_recv().unwrap();
    assert_eq!(
        outcome,
        Err(SyncRejected {
            action: add("a"),
            reason: "denied".into(),
        })
    );
    // The undone entry's contribution is gone from the state.
    assert_eq!(store.state().value, "0");
}

#[tokio::test]
async fn sync_dispatch_marks_the_entry() {
    let log = new_log();
    let store = open_store(log.clone(), StoreConfig::default()).await;

    let implicit = store
        .dispatch_sync(add("a"), MetaDraft::new())
        .await
        .unwrap();
    let (_, meta) = log.by_id(&implicit.meta.id).await.unwrap().unwrap();
    assert!(meta.sync);
    assert!(meta.reasons.has(tag::SYNCING));
    assert!(meta.reasons.has(tag::TIME_TRAVEL));

    let explicit = store
        .dispatch_sync(add("b"), MetaDraft::new().with_reason("mine"))
        .await
        .unwrap();
    let (_, meta) = log.by_id(&explicit.meta.id).await.unwrap().unwrap();
    assert!(meta.reasons.has(tag::SYNCING));
    assert!(meta.reasons.has("mine"));
    assert!(!meta.reasons.has(tag::TIME_TRAVEL));
}

#[tokio::test]
async fn confirmed_entry_loses_its_syncing_reason() {
    let log = new_log();
    let store = open_store(log.clone(), StoreConfig::default()).await;
    let ticket = store
        .dispatch_sync(add("a"), MetaDraft::new())
        .await
        .unwrap();

    // With the implicit retention stripped, only the syncing tag keeps the
    // entry alive.
    log.remove_reason(tag::TIME_TRAVEL, Default::default())
        .await
        .unwrap();
    assert_eq!(log.len(), 1);

    store
        .dispatch_cross_tab(Action::processed(&ticket.meta.id), MetaDraft::new())
        .await
        .unwrap();
    assert!(log.is_empty());
    assert_eq!(store.state().value, "0a");
}

#[tokio::test]
async fn settlement_survives_a_dropped_ticket() {
    let store = open_store(new_log(), StoreConfig::default()).await;
    let ticket = store
        .dispatch_sync(add("a"), MetaDraft::new())
        .await
        .unwrap();
    let id = ticket.meta.id.clone();
    drop(ticket);

    store
        .dispatch_cross_tab(Action::processed(&id), MetaDraft::new())
        .await
        .unwrap();
    assert_eq!(store.state().value, "0a");
}
