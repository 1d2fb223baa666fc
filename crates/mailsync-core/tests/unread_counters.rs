//! Integration tests for unread counter observation and refresh.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use common::{Harness, Offline};
use mailsync_core::model::{ResponseSource, UnreadCounter, system_labels};
use mailsync_core::remote::{AlwaysOnline, CountEntry};
use mailsync_core::{AccountId, CounterKind, DataResult};

const ACCOUNT: AccountId = AccountId(1);

fn labels(result: &DataResult<Vec<UnreadCounter>>) -> Vec<(String, u32)> {
    result
        .value()
        .unwrap()
        .iter()
        .map(|c| (c.label_id.clone(), c.count))
        .collect()
}

async fn seed_counters(harness: &Harness) {
    let counters = UnreadCounter::from_entries(
        ACCOUNT,
        CounterKind::Conversations,
        &[
            CountEntry::new(system_labels::INBOX, 10, 4),
            CountEntry::new("stale", 2, 2),
        ],
    );
    harness
        .store
        .replace_counters(ACCOUNT, CounterKind::Conversations, counters)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_refresh_replaces_whole_slice() {
    let harness = Harness::new().await;
    seed_counters(&harness).await;
    harness.api.set_counts(
        CounterKind::Conversations,
        vec![
            CountEntry::new(system_labels::INBOX, 10, 1),
            CountEntry::new(system_labels::SPAM, 3, 3),
        ],
    );
    let cache = harness.counters(Arc::new(AlwaysOnline));

    cache.refresh(ACCOUNT, CounterKind::Conversations).await.unwrap();

    let stored = harness
        .store
        .list_counters(ACCOUNT, CounterKind::Conversations)
        .await
        .unwrap();
    let labels: Vec<(&str, u32)> = stored
        .iter()
        .map(|c| (c.label_id.as_str(), c.count))
        .collect();
    assert_eq!(labels, vec![(system_labels::INBOX, 1), (system_labels::SPAM, 3)]);
    assert!(
        harness
            .store
            .list_counters(ACCOUNT, CounterKind::Messages)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_observe_emits_local_then_refreshed() {
    let harness = Harness::new().await;
    seed_counters(&harness).await;
    harness.api.set_counts(
        CounterKind::Conversations,
        vec![CountEntry::new(system_labels::INBOX, 10, 1)],
    );
    let cache = harness.counters(Arc::new(AlwaysOnline));

    let mut observation = cache.observe(ACCOUNT, CounterKind::Conversations);

    let local = observation.next().await.unwrap();
    assert_eq!(local.source(), ResponseSource::Local);
    assert_eq!(
        labels(&local),
        vec![("0".to_string(), 4), ("stale".to_string(), 2)]
    );

    let refreshed = observation.next().await.unwrap();
    assert_eq!(labels(&refreshed), vec![("0".to_string(), 1)]);
}

#[tokio::test]
async fn test_identical_replace_still_emits() {
    let harness = Harness::new().await;
    let cache = harness.counters(Arc::new(Offline));
    let mut observation = cache.observe(ACCOUNT, CounterKind::Messages);
    assert_eq!(observation.next().await.unwrap(), DataResult::local(Vec::new()));

    for _ in 0..2 {
        harness
            .store
            .replace_counters(ACCOUNT, CounterKind::Messages, Vec::new())
            .await
            .unwrap();
        let item = tokio::time::timeout(Duration::from_secs(1), observation.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item, DataResult::local(Vec::new()));
    }
    assert_eq!(harness.api.call_count("fetch_unread_counts:messages"), 0);
}

#[tokio::test]
async fn test_other_kind_changes_are_ignored() {
    let harness = Harness::new().await;
    let cache = harness.counters(Arc::new(Offline));
    let mut observation = cache.observe(ACCOUNT, CounterKind::Messages);
    observation.next().await.unwrap();

    seed_counters(&harness).await;

    let quiet = tokio::time::timeout(Duration::from_millis(100), observation.next()).await;
    assert!(quiet.is_err());
}

#[tokio::test]
async fn test_refresh_failure_emits_remote_error() {
    let harness = Harness::new().await;
    seed_counters(&harness).await;
    harness.api.fail_counts("Counts unavailable");
    let cache = harness.counters(Arc::new(AlwaysOnline));

    let mut observation = cache.observe(ACCOUNT, CounterKind::Conversations);

    assert_eq!(observation.next().await.unwrap().source(), ResponseSource::Local);
    assert_eq!(
        observation.next().await.unwrap(),
        DataResult::remote_error("Counts unavailable")
    );
    // The stored counters are untouched.
    assert_eq!(
        harness
            .store
            .list_counters(ACCOUNT, CounterKind::Conversations)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_concurrent_refreshes_serialize() {
    let harness = Harness::new().await;
    harness.api.set_counts(
        CounterKind::Messages,
        vec![CountEntry::new(system_labels::INBOX, 5, 5)],
    );
    let cache = harness.counters(Arc::new(AlwaysOnline));

    let (first, second) = tokio::join!(
        cache.refresh(ACCOUNT, CounterKind::Messages),
        cache.refresh(ACCOUNT, CounterKind::Messages)
    );

    first.unwrap();
    second.unwrap();
    assert_eq!(harness.api.call_count("fetch_unread_counts:messages"), 2);
    assert_eq!(
        harness
            .store
            .list_counters(ACCOUNT, CounterKind::Messages)
            .await
            .unwrap()
            .len(),
        1
    );
}
