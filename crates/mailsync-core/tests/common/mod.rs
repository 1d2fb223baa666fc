//! Shared fakes and fixtures for the integration tests.
//!
//! Each test binary uses a different subset of these helpers.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use mailsync_core::model::{Conversation, ConversationId, CounterKind, LabelContext, Message};
use mailsync_core::remote::{
    Connectivity, ContactsRefresher, ConversationDetail, ConversationListParams, ConversationsPage,
    CountEntry, EventPage, LatestEvent, MailApi, RESPONSE_CODE_OK,
};
use mailsync_core::{
    AccountId, ConversationCache, Error, EventSyncEngine, MailboxStore, MemoryCursorStore, Result,
    SessionManager, UnreadCounterCache,
};

/// Installs a test subscriber honouring `RUST_LOG`, once per binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How the fake answers a conversation list request.
#[derive(Debug, Clone)]
pub enum ListReply {
    Page(ConversationsPage),
    Fail(String),
    Cancel,
}

impl Default for ListReply {
    fn default() -> Self {
        Self::Page(ConversationsPage::default())
    }
}

#[derive(Default)]
struct FakeState {
    pages: HashMap<String, EventPage>,
    latest: String,
    list: ListReply,
    list_gate: Option<Arc<Notify>>,
    details: HashMap<String, ConversationDetail>,
    detail_failure: Option<Error>,
    counts: HashMap<CounterKind, Vec<CountEntry>>,
    counts_failure: Option<String>,
    calls: Vec<String>,
    list_requests: Vec<ConversationListParams>,
}

/// Scripted in-memory [`MailApi`].
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serves `page` to `check_events` calls at `cursor`.
    pub fn set_page(&self, cursor: &str, page: EventPage) {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(cursor.to_string(), page);
    }

    pub fn set_latest(&self, event_id: &str) {
        self.state.lock().unwrap().latest = event_id.to_string();
    }

    pub fn set_list(&self, reply: ListReply) {
        self.state.lock().unwrap().list = reply;
    }

    /// Holds list requests until the returned gate is notified.
    pub fn gate_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().list_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn set_detail(&self, conversation: Conversation, messages: Vec<Message>) {
        let key = conversation.id.to_string();
        self.set_detail_for(&key, conversation, messages);
    }

    /// Serves `conversation` to fetches of `id`, whatever its own id.
    pub fn set_detail_for(&self, id: &str, conversation: Conversation, messages: Vec<Message>) {
        self.state.lock().unwrap().details.insert(
            id.to_string(),
            ConversationDetail {
                conversation,
                messages,
            },
        );
    }

    pub fn fail_details(&self, error: Error) {
        self.state.lock().unwrap().detail_failure = Some(error);
    }

    pub fn set_counts(&self, kind: CounterKind, counts: Vec<CountEntry>) {
        self.state.lock().unwrap().counts.insert(kind, counts);
    }

    pub fn fail_counts(&self, message: &str) {
        self.state.lock().unwrap().counts_failure = Some(message.to_string());
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == name).count()
    }

    /// Parameters of every list request, in order.
    pub fn list_requests(&self) -> Vec<ConversationListParams> {
        self.state.lock().unwrap().list_requests.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }
}

#[async_trait]
impl MailApi for FakeApi {
    async fn check_events(&self, _account_id: AccountId, cursor: &str) -> Result<EventPage> {
        self.record(format!("check_events:{cursor}"));
        let page = self.state.lock().unwrap().pages.get(cursor).cloned();
        page.ok_or_else(|| Error::Transport(format!("no event page at {cursor}")))
    }

    async fn latest_event_id(&self, _account_id: AccountId) -> Result<LatestEvent> {
        self.record("latest_event_id");
        let event_id = self.state.lock().unwrap().latest.clone();
        Ok(LatestEvent {
            code: RESPONSE_CODE_OK,
            event_id,
            error: None,
        })
    }

    async fn list_conversations(
        &self,
        params: &ConversationListParams,
    ) -> Result<ConversationsPage> {
        self.record("list_conversations");
        self.state.lock().unwrap().list_requests.push(params.clone());
        let gate = self.state.lock().unwrap().list_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.record("list_conversations:done");

        let reply = self.state.lock().unwrap().list.clone();
        match reply {
            ListReply::Page(page) => Ok(page),
            ListReply::Fail(message) => Err(Error::Transport(message)),
            ListReply::Cancel => Err(Error::Cancelled),
        }
    }

    async fn fetch_conversation(
        &self,
        _account_id: AccountId,
        conversation_id: &ConversationId,
    ) -> Result<ConversationDetail> {
        self.record(format!("fetch_conversation:{conversation_id}"));
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.detail_failure.take() {
            return Err(error);
        }
        state
            .details
            .get(conversation_id.as_str())
            .cloned()
            .ok_or_else(|| Error::NotFound(conversation_id.to_string()))
    }

    async fn fetch_unread_counts(
        &self,
        _account_id: AccountId,
        kind: CounterKind,
    ) -> Result<Vec<CountEntry>> {
        self.record(format!("fetch_unread_counts:{}", kind.as_str()));
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.counts_failure {
            return Err(Error::Transport(message.clone()));
        }
        Ok(state.counts.get(&kind).cloned().unwrap_or_default())
    }
}

/// Contacts collaborator that counts refreshes.
#[derive(Default)]
pub struct CountingContacts {
    refreshes: AtomicUsize,
}

impl CountingContacts {
    pub fn count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContactsRefresher for CountingContacts {
    async fn refresh_contacts(&self, _account_id: AccountId) -> Result<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connectivity that never reaches the server.
pub struct Offline;

impl Connectivity for Offline {
    fn is_reachable(&self) -> bool {
        false
    }
}

/// Wired collaborators around one in-memory store.
pub struct Harness {
    pub api: Arc<FakeApi>,
    pub store: Arc<MailboxStore>,
    pub cursors: Arc<MemoryCursorStore>,
    pub contacts: Arc<CountingContacts>,
    pub sessions: Arc<SessionManager>,
}

impl Harness {
    pub async fn new() -> Self {
        init_tracing();
        let api = FakeApi::new();
        let store = Arc::new(MailboxStore::in_memory().await.unwrap());
        let cursors = Arc::new(MemoryCursorStore::new());
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&cursors) as _,
            Arc::clone(&store),
        ));
        Self {
            api,
            store,
            cursors,
            contacts: Arc::new(CountingContacts::default()),
            sessions,
        }
    }

    pub fn engine(&self) -> EventSyncEngine {
        EventSyncEngine::new(
            Arc::clone(&self.api) as _,
            Arc::clone(&self.store),
            Arc::clone(&self.cursors) as _,
            Arc::clone(&self.contacts) as _,
            Arc::clone(&self.sessions),
        )
    }

    pub fn conversations(&self, connectivity: Arc<dyn Connectivity>) -> ConversationCache {
        ConversationCache::new(
            Arc::clone(&self.store),
            Arc::clone(&self.api) as _,
            connectivity,
            Arc::clone(&self.store) as _,
        )
    }

    pub fn counters(&self, connectivity: Arc<dyn Connectivity>) -> UnreadCounterCache {
        UnreadCounterCache::new(Arc::clone(&self.store), Arc::clone(&self.api) as _, connectivity)
    }
}

/// Conversation with a context per label, one message each.
pub fn conversation(account_id: AccountId, id: &str, labels: &[&str], order: i64) -> Conversation {
    let mut conversation = Conversation::new(account_id, id);
    conversation.subject = format!("Subject {id}");
    conversation.num_messages = 1;
    conversation.order = order;
    for label in labels {
        conversation = conversation.with_context(LabelContext {
            label_id: (*label).to_string(),
            num_messages: 1,
            time: order,
            ..LabelContext::default()
        });
    }
    conversation
}

pub fn message(id: &str, conversation_id: &str, labels: &[&str], unread: bool, time: i64) -> Message {
    Message::new(id, conversation_id)
        .with_labels_added(labels.iter().copied())
        .with_read(!unread)
        .with_time(time)
}

pub fn ok_page(event_id: &str) -> EventPage {
    EventPage {
        code: RESPONSE_CODE_OK,
        event_id: event_id.to_string(),
        ..EventPage::default()
    }
}
