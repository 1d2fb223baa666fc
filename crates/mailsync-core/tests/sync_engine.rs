//! Integration tests for event log catch-up and the sync worker.

#![allow(clippy::unwrap_used)]

mod common;

use common::{Harness, ListReply, conversation, message, ok_page};
use mailsync_core::model::{ConversationId, CounterKind, MessageId, system_labels};
use mailsync_core::remote::{ConversationsPage, CountEntry, EventAction, EventEntry, EventPage};
use mailsync_core::store::StoreOp;
use mailsync_core::sync::staging;
use mailsync_core::{AccountId, CursorStore, Error, SyncConfig, SyncPhase, SyncWorker};

const ACCOUNT: AccountId = AccountId(1);

fn update_message_page(event_id: &str) -> EventPage {
    let updated = message("msgA", "c1", &[system_labels::INBOX], false, 100);
    EventPage {
        entries: vec![
            EventEntry::Message {
                id: MessageId::from("msgA"),
                action: EventAction::Update,
                message: Some(updated),
            },
            EventEntry::Counters {
                kind: CounterKind::Messages,
                counts: vec![CountEntry::new(system_labels::INBOX, 1, 0)],
            },
        ],
        ..ok_page(event_id)
    }
}

async fn seed_unread_message(harness: &Harness) {
    let unread = message("msgA", "c1", &[system_labels::INBOX], true, 100);
    harness
        .store
        .commit(
            ACCOUNT,
            [
                StoreOp::UpsertConversation(conversation(ACCOUNT, "c1", &[system_labels::INBOX], 100)),
                StoreOp::UpsertMessage(unread),
            ]
            .into_iter()
            .collect(),
        )
        .await
        .unwrap();
}

async fn snapshot(harness: &Harness) -> (Vec<mailsync_core::Conversation>, Vec<mailsync_core::Message>) {
    let conversations = harness.store.list_conversations(ACCOUNT).await.unwrap();
    let messages = harness
        .store
        .list_messages(ACCOUNT, &ConversationId::from("c1"))
        .await
        .unwrap();
    (conversations, messages)
}

#[tokio::test]
async fn test_first_drain_bootstraps_mailbox() {
    let harness = Harness::new().await;
    harness.api.set_list(ListReply::Page(ConversationsPage {
        total: 1,
        conversations: vec![conversation(ACCOUNT, "c1", &[system_labels::ALL_MAIL], 10)],
    }));
    harness.api.set_counts(
        CounterKind::Messages,
        vec![CountEntry::new(system_labels::INBOX, 3, 2)],
    );
    harness.api.set_latest("4");
    harness.api.set_page("4", ok_page("4"));

    let stats = harness.engine().drain(ACCOUNT).await.unwrap();

    assert_eq!(stats.refreshes, 1);
    assert_eq!(stats.pages, 1);
    assert_eq!(harness.contacts.count(), 1);
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap().as_deref(), Some("4"));
    assert_eq!(
        harness.api.calls(),
        vec![
            "list_conversations",
            "list_conversations:done",
            "fetch_unread_counts:messages",
            "fetch_unread_counts:conversations",
            "latest_event_id",
            "check_events:4",
        ]
    );

    let stored = harness.store.list_conversations(ACCOUNT).await.unwrap();
    assert_eq!(stored.len(), 1);
    let counters = harness
        .store
        .list_counters(ACCOUNT, CounterKind::Messages)
        .await
        .unwrap();
    assert_eq!(counters.len(), 1);
    assert_eq!(counters[0].count, 2);
    assert_eq!(harness.sessions.phase(ACCOUNT).await, Some(SyncPhase::Idle));
}

#[tokio::test]
async fn test_page_updates_message_and_advances_cursor() {
    let harness = Harness::new().await;
    seed_unread_message(&harness).await;
    harness.cursors.write(ACCOUNT, "4").unwrap();
    harness.api.set_page("4", update_message_page("5"));

    let more = harness.engine().next_event(ACCOUNT).await.unwrap();

    assert!(!more);
    let stored = harness
        .store
        .get_message(ACCOUNT, &MessageId::from("msgA"))
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.unread);
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap().as_deref(), Some("5"));
    assert_eq!(harness.contacts.count(), 0);
}

#[tokio::test]
async fn test_applying_page_twice_is_idempotent() {
    let harness = Harness::new().await;
    seed_unread_message(&harness).await;
    harness.api.set_page("4", update_message_page("5"));
    let engine = harness.engine();

    harness.cursors.write(ACCOUNT, "4").unwrap();
    engine.next_event(ACCOUNT).await.unwrap();
    let once = snapshot(&harness).await;

    harness.cursors.write(ACCOUNT, "4").unwrap();
    engine.next_event(ACCOUNT).await.unwrap();
    let twice = snapshot(&harness).await;

    assert_eq!(once, twice);
    assert_eq!(twice.1.len(), 1);
}

#[tokio::test]
async fn test_commit_without_cursor_write_replays_cleanly() {
    let harness = Harness::new().await;
    seed_unread_message(&harness).await;
    harness.cursors.write(ACCOUNT, "4").unwrap();
    let page = update_message_page("5");
    harness.api.set_page("4", page.clone());

    // Commit landed but the process died before the cursor write.
    harness
        .store
        .commit(ACCOUNT, staging::stage(ACCOUNT, &page.entries))
        .await
        .unwrap();
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap().as_deref(), Some("4"));

    harness.engine().drain(ACCOUNT).await.unwrap();

    let (_, messages) = snapshot(&harness).await;
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].unread);
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap().as_deref(), Some("5"));
}

#[tokio::test]
async fn test_api_error_leaves_cursor_untouched() {
    let harness = Harness::new().await;
    harness.cursors.write(ACCOUNT, "4").unwrap();
    harness.api.set_page(
        "4",
        EventPage {
            code: 2001,
            error: Some("Invalid event id".to_string()),
            ..ok_page("5")
        },
    );

    let result = harness.engine().next_event(ACCOUNT).await;

    match result {
        Err(Error::Api { code, message }) => {
            assert_eq!(code, 2001);
            assert_eq!(message, "Invalid event id");
        }
        other => panic!("expected an API error, got {other:?}"),
    }
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap().as_deref(), Some("4"));
}

#[tokio::test]
async fn test_transport_error_aborts_drain() {
    let harness = Harness::new().await;
    harness.cursors.write(ACCOUNT, "4").unwrap();

    let result = harness.engine().drain(ACCOUNT).await;

    assert!(matches!(result, Err(Error::Transport(_))));
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap().as_deref(), Some("4"));
}

#[tokio::test]
async fn test_refresh_flag_rebuilds_mailbox() {
    let harness = Harness::new().await;
    harness
        .store
        .upsert_conversations(ACCOUNT, &[conversation(ACCOUNT, "stale", &[system_labels::INBOX], 1)])
        .await
        .unwrap();
    harness.cursors.write(ACCOUNT, "4").unwrap();
    harness.api.set_page(
        "4",
        EventPage {
            refresh: true,
            ..update_message_page("5")
        },
    );
    harness.api.set_list(ListReply::Page(ConversationsPage {
        total: 1,
        conversations: vec![conversation(ACCOUNT, "fresh", &[system_labels::ALL_MAIL], 2)],
    }));
    harness.api.set_latest("9");
    harness.api.set_page("9", ok_page("9"));

    let stats = harness.engine().drain(ACCOUNT).await.unwrap();

    assert_eq!(stats.refreshes, 1);
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap().as_deref(), Some("9"));
    let ids: Vec<String> = harness
        .store
        .list_conversations(ACCOUNT)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id.to_string())
        .collect();
    assert_eq!(ids, vec!["fresh"]);
    // Entries of a refresh page are discarded.
    assert!(
        harness
            .store
            .get_message(ACCOUNT, &MessageId::from("msgA"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_empty_cursor_forces_bootstrap() {
    let harness = Harness::new().await;
    harness.cursors.write(ACCOUNT, "").unwrap();
    harness.api.set_latest("7");
    harness.api.set_page("7", ok_page("7"));

    harness.engine().next_event(ACCOUNT).await.unwrap();

    assert_eq!(harness.api.call_count("latest_event_id"), 1);
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap().as_deref(), Some("7"));
}

#[tokio::test]
async fn test_refresh_contacts_flag_refreshes_inline() {
    let harness = Harness::new().await;
    harness.cursors.write(ACCOUNT, "4").unwrap();
    harness.api.set_page(
        "4",
        EventPage {
            refresh_contacts: true,
            ..ok_page("5")
        },
    );

    harness.engine().next_event(ACCOUNT).await.unwrap();

    assert_eq!(harness.contacts.count(), 1);
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap().as_deref(), Some("5"));
}

#[tokio::test]
async fn test_drain_follows_has_more() {
    let harness = Harness::new().await;
    harness.cursors.write(ACCOUNT, "4").unwrap();
    harness.api.set_page(
        "4",
        EventPage {
            has_more: true,
            ..ok_page("5")
        },
    );
    harness.api.set_page("5", ok_page("6"));

    let stats = harness.engine().drain(ACCOUNT).await.unwrap();

    assert_eq!(stats.pages, 2);
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap().as_deref(), Some("6"));
}

#[tokio::test]
async fn test_start_continues_past_failed_account() {
    let harness = Harness::new().await;
    let broken = AccountId::new(1);
    let healthy = AccountId::new(2);
    harness.cursors.write(broken, "missing").unwrap();
    harness.cursors.write(healthy, "4").unwrap();
    harness.api.set_page("4", ok_page("5"));

    let report = harness.engine().start(&[broken, healthy]).await;

    assert!(!report.is_success());
    assert_eq!(report.failed(), vec![broken]);
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(harness.cursors.read(healthy).unwrap().as_deref(), Some("5"));
    assert_eq!(harness.sessions.logged_in().await, vec![broken, healthy]);
}

#[tokio::test]
async fn test_worker_drains_on_request_and_stops() {
    let harness = Harness::new().await;
    harness.cursors.write(ACCOUNT, "4").unwrap();
    harness.api.set_page("4", ok_page("5"));
    let config = SyncConfig {
        poll_interval_secs: 0,
        ..SyncConfig::default()
    };

    let (handle, task) = SyncWorker::spawn(harness.engine(), &config);

    let stats = handle.sync(ACCOUNT).await.unwrap();
    assert_eq!(stats.pages, 1);

    harness.api.set_page("5", ok_page("5"));
    let report = handle.sync_all(vec![ACCOUNT]).await.unwrap();
    assert_eq!(report.failed(), Vec::<AccountId>::new());

    handle.shutdown().await;
    task.await.unwrap();
    assert!(matches!(handle.sync(ACCOUNT).await, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_worker_refresh_uses_configured_page_size() {
    let harness = Harness::new().await;
    harness.api.set_latest("1");
    harness.api.set_page("1", ok_page("1"));
    let config = SyncConfig {
        page_size: 25,
        poll_interval_secs: 0,
        ..SyncConfig::default()
    };

    let (handle, task) = SyncWorker::spawn(harness.engine(), &config);
    handle.sync(ACCOUNT).await.unwrap();
    handle.shutdown().await;
    task.await.unwrap();

    let requests = harness.api.list_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].page_size, 25);
    assert_eq!(requests[0].label_id, system_labels::ALL_MAIL);
}

#[tokio::test]
async fn test_logout_clears_cursor_and_rows() {
    let harness = Harness::new().await;
    seed_unread_message(&harness).await;
    harness.cursors.write(ACCOUNT, "4").unwrap();
    harness.api.set_page("4", ok_page("5"));
    harness.engine().drain(ACCOUNT).await.unwrap();

    harness.sessions.logout(ACCOUNT).await.unwrap();

    assert!(!harness.sessions.is_logged_in(ACCOUNT).await);
    assert_eq!(harness.cursors.read(ACCOUNT).unwrap(), None);
    assert!(harness.store.list_conversations(ACCOUNT).await.unwrap().is_empty());
    assert!(snapshot(&harness).await.1.is_empty());
}
