//! Event log catch-up.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::staging;
use crate::account::{SessionManager, SyncPhase};
use crate::cursor::{self, CursorStore, EventCursor};
use crate::model::{CounterKind, UnreadCounter, system_labels};
use crate::remote::{ContactsRefresher, ConversationListParams, EventPage, MailApi};
use crate::store::{MailboxStore, StoreOp, WriteBatch};
use crate::{AccountId, Result};

/// Default number of conversations fetched by a full refresh.
pub const DEFAULT_BOOTSTRAP_PAGE_SIZE: u32 = 50;

/// What one drain of an account did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Event pages applied.
    pub pages: usize,
    /// Store writes committed from those pages.
    pub writes: usize,
    /// Full mailbox refreshes performed.
    pub refreshes: usize,
}

/// Per-account outcomes of [`EventSyncEngine::start`].
#[derive(Debug, Default)]
pub struct SyncReport {
    /// One outcome per account, in the order they were drained.
    pub outcomes: Vec<(AccountId, Result<DrainStats>)>,
}

impl SyncReport {
    /// Returns true if every account drained successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_ok())
    }

    /// Accounts whose drain failed.
    #[must_use]
    pub fn failed(&self) -> Vec<AccountId> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_err())
            .map(|(account_id, _)| *account_id)
            .collect()
    }
}

/// Pulls the server event log and applies it to the store.
///
/// Each applied page is committed in one transaction before the cursor
/// advances, so a crash between the two replays the page on restart.
pub struct EventSyncEngine {
    api: Arc<dyn MailApi>,
    store: Arc<MailboxStore>,
    cursors: Arc<dyn CursorStore>,
    contacts: Arc<dyn ContactsRefresher>,
    sessions: Arc<SessionManager>,
    bootstrap_page_size: u32,
}

impl EventSyncEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        api: Arc<dyn MailApi>,
        store: Arc<MailboxStore>,
        cursors: Arc<dyn CursorStore>,
        contacts: Arc<dyn ContactsRefresher>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            api,
            store,
            cursors,
            contacts,
            sessions,
            bootstrap_page_size: DEFAULT_BOOTSTRAP_PAGE_SIZE,
        }
    }

    /// Builder method to set how many conversations a full refresh fetches.
    #[must_use]
    pub const fn with_bootstrap_page_size(mut self, page_size: u32) -> Self {
        self.bootstrap_page_size = page_size;
        self
    }

    /// The session manager this engine reports phases to.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Reads the account's current cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor store cannot be read.
    pub async fn cursor(&self, account_id: AccountId) -> Result<EventCursor> {
        cursor::blocking(&self.cursors, move |store| EventCursor::load(store, account_id)).await
    }

    async fn write_cursor(&self, account_id: AccountId, value: &str) -> Result<()> {
        let value = value.to_string();
        cursor::blocking(&self.cursors, move |store| store.write(account_id, &value)).await
    }

    /// Drains every account in turn.
    ///
    /// A failing account is recorded in the report and does not stop the
    /// remaining ones.
    pub async fn start(&self, accounts: &[AccountId]) -> SyncReport {
        let mut report = SyncReport::default();
        for &account_id in accounts {
            self.sessions.login(account_id).await;
        }

        for &account_id in accounts {
            let outcome = self.drain(account_id).await;
            if let Err(e) = &outcome {
                warn!("Sync failed for account {account_id}: {e}");
            }
            report.outcomes.push((account_id, outcome));
        }
        report
    }

    /// Applies event pages until the server reports nothing more pending.
    ///
    /// # Errors
    ///
    /// Returns the first failure; pages applied before it stay applied.
    pub async fn drain(&self, account_id: AccountId) -> Result<DrainStats> {
        self.sessions.login(account_id).await;
        self.sessions
            .set_phase(account_id, SyncPhase::CatchingUp)
            .await;

        let mut stats = DrainStats::default();
        loop {
            match self.step(account_id, &mut stats).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    self.sessions
                        .set_phase(account_id, SyncPhase::CatchingUp)
                        .await;
                    return Err(e);
                }
            }
        }

        self.sessions.set_phase(account_id, SyncPhase::Idle).await;
        debug!(
            "Account {account_id} caught up: {} pages, {} writes, {} refreshes",
            stats.pages, stats.writes, stats.refreshes
        );
        Ok(stats)
    }

    /// Applies at most one event page.
    ///
    /// Returns true if more events are pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the server call, the store commit or the cursor
    /// write fails. The cursor is left untouched in every failure case.
    pub async fn next_event(&self, account_id: AccountId) -> Result<bool> {
        let mut stats = DrainStats::default();
        self.step(account_id, &mut stats).await
    }

    async fn step(&self, account_id: AccountId, stats: &mut DrainStats) -> Result<bool> {
        let cursor = self.cursor(account_id).await?;
        let position = match cursor.position() {
            Some(position) => position.to_string(),
            None => {
                stats.refreshes += 1;
                self.bootstrap(account_id).await?
            }
        };

        let page = self.api.check_events(account_id, &position).await?;
        page.ensure_ok()?;
        self.apply_page(account_id, page, stats).await
    }

    async fn apply_page(
        &self,
        account_id: AccountId,
        page: EventPage,
        stats: &mut DrainStats,
    ) -> Result<bool> {
        if page.refresh_contacts {
            self.contacts.refresh_contacts(account_id).await?;
        }

        if page.refresh {
            warn!("Server requested a full refresh for account {account_id}");
            self.write_cursor(account_id, "").await?;
            stats.refreshes += 1;
            self.bootstrap(account_id).await?;
            return Ok(true);
        }

        let batch = staging::stage(account_id, &page.entries);
        stats.writes += batch.len();
        self.store.commit(account_id, batch).await?;
        self.write_cursor(account_id, &page.event_id).await?;
        stats.pages += 1;

        debug!(
            "Applied {} events for account {account_id}, cursor now {}",
            page.entries.len(),
            page.event_id
        );
        Ok(page.has_more)
    }

    /// Rebuilds the account from scratch and returns the new cursor.
    async fn bootstrap(&self, account_id: AccountId) -> Result<String> {
        info!("Refreshing mailbox for account {account_id}");
        self.contacts.refresh_contacts(account_id).await?;
        self.refresh_mailbox(account_id).await?;

        let latest = self.api.latest_event_id(account_id).await?;
        latest.ensure_ok()?;
        self.write_cursor(account_id, &latest.event_id).await?;
        Ok(latest.event_id)
    }

    async fn refresh_mailbox(&self, account_id: AccountId) -> Result<()> {
        self.sessions.set_phase(account_id, SyncPhase::Locked).await;
        self.write_cursor(account_id, "").await?;

        let params = ConversationListParams::new(
            account_id,
            system_labels::ALL_MAIL,
            self.bootstrap_page_size,
        );
        let page = self.api.list_conversations(&params).await?;
        let message_counts = self
            .api
            .fetch_unread_counts(account_id, CounterKind::Messages)
            .await?;
        let conversation_counts = self
            .api
            .fetch_unread_counts(account_id, CounterKind::Conversations)
            .await?;

        let mut batch = WriteBatch::new().with(StoreOp::ClearMailbox);
        batch.extend(page.conversations.into_iter().map(|mut conversation| {
            conversation.account_id = account_id;
            StoreOp::UpsertConversation(conversation.without_messages())
        }));
        batch.push(StoreOp::ReplaceCounters {
            kind: CounterKind::Messages,
            counters: UnreadCounter::from_entries(account_id, CounterKind::Messages, &message_counts),
        });
        batch.push(StoreOp::ReplaceCounters {
            kind: CounterKind::Conversations,
            counters: UnreadCounter::from_entries(
                account_id,
                CounterKind::Conversations,
                &conversation_counts,
            ),
        });
        self.store.commit(account_id, batch).await?;

        self.sessions
            .set_phase(account_id, SyncPhase::CatchingUp)
            .await;
        Ok(())
    }
}
