//! Logged-in accounts and their sync phase.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use super::AccountId;
use crate::Result;
use crate::cursor::{self, CursorStore};
use crate::store::MailboxStore;

/// Where an account is in its synchronization lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// Logged in, never synchronized.
    #[default]
    Uninitialized,
    /// Reading event pages.
    CatchingUp,
    /// Caught up with the server.
    Idle,
    /// A full mailbox refresh is in progress.
    Locked,
}

/// Per-account session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSession {
    /// The account.
    pub account_id: AccountId,
    /// Current phase.
    pub phase: SyncPhase,
    /// When the session started.
    pub logged_in_at: DateTime<Utc>,
    /// When the account last caught up with the server.
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl AccountSession {
    fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            phase: SyncPhase::Uninitialized,
            logged_in_at: Utc::now(),
            last_synced_at: None,
        }
    }
}

/// Tracks logged-in accounts.
///
/// Logging out removes the account's cursor and all of its stored rows.
pub struct SessionManager {
    sessions: RwLock<HashMap<AccountId, AccountSession>>,
    cursors: Arc<dyn CursorStore>,
    store: Arc<MailboxStore>,
}

impl SessionManager {
    /// Create a manager with no logged-in accounts.
    pub fn new(cursors: Arc<dyn CursorStore>, store: Arc<MailboxStore>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            cursors,
            store,
        }
    }

    /// Registers an account. Returns false if it was already logged in.
    pub async fn login(&self, account_id: AccountId) -> bool {
        {
            let sessions = self.sessions.read().await;
            if sessions.contains_key(&account_id) {
                return false;
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&account_id) {
            return false;
        }
        sessions.insert(account_id, AccountSession::new(account_id));
        info!("Account {account_id} logged in");
        true
    }

    /// Ends the session and removes every trace of the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor or the stored rows cannot be removed.
    pub async fn logout(&self, account_id: AccountId) -> Result<()> {
        self.sessions.write().await.remove(&account_id);
        cursor::blocking(&self.cursors, move |store| store.clear(account_id)).await?;
        self.store.clear_account(account_id).await?;
        info!("Account {account_id} logged out");
        Ok(())
    }

    /// Returns true if the account is logged in.
    pub async fn is_logged_in(&self, account_id: AccountId) -> bool {
        self.sessions.read().await.contains_key(&account_id)
    }

    /// Logged-in accounts in ascending id order.
    pub async fn logged_in(&self) -> Vec<AccountId> {
        let mut accounts: Vec<_> = self.sessions.read().await.keys().copied().collect();
        accounts.sort_unstable();
        accounts
    }

    /// Snapshot of the account's session.
    pub async fn session(&self, account_id: AccountId) -> Option<AccountSession> {
        self.sessions.read().await.get(&account_id).cloned()
    }

    /// Current phase of the account.
    pub async fn phase(&self, account_id: AccountId) -> Option<SyncPhase> {
        self.sessions
            .read()
            .await
            .get(&account_id)
            .map(|session| session.phase)
    }

    pub(crate) async fn set_phase(&self, account_id: AccountId, phase: SyncPhase) {
        if let Some(session) = self.sessions.write().await.get_mut(&account_id) {
            session.phase = phase;
            if phase == SyncPhase::Idle {
                session.last_synced_at = Some(Utc::now());
            }
        }
    }
}
