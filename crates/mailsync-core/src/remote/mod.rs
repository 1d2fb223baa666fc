//! Seams to the remote mail API and its collaborators.
//!
//! Wire transport is supplied by the embedding application through
//! [`MailApi`]; everything here is transport-agnostic.

mod action;
mod types;

pub use action::RemoteAction;
pub use types::{
    ConversationDetail, ConversationListParams, ConversationsPage, CountEntry, EventAction,
    EventEntry, EventPage, LatestEvent, RESPONSE_CODE_OK,
};

use async_trait::async_trait;

use crate::model::{ConversationId, CounterKind};
use crate::{AccountId, Result};

/// The remote mail API.
///
/// Implementations report transport failures as [`crate::Error::Transport`]
/// and cancelled calls as [`crate::Error::Cancelled`]. Non-OK response codes
/// are returned inside the page so the caller can inspect them.
#[async_trait]
pub trait MailApi: Send + Sync {
    /// Fetches the event page following `cursor`.
    async fn check_events(&self, account_id: AccountId, cursor: &str) -> Result<EventPage>;

    /// Fetches the newest event id.
    async fn latest_event_id(&self, account_id: AccountId) -> Result<LatestEvent>;

    /// Lists conversations under a label.
    async fn list_conversations(&self, params: &ConversationListParams)
    -> Result<ConversationsPage>;

    /// Fetches one conversation with its messages.
    async fn fetch_conversation(
        &self,
        account_id: AccountId,
        conversation_id: &ConversationId,
    ) -> Result<ConversationDetail>;

    /// Fetches every unread counter of `kind`.
    async fn fetch_unread_counts(
        &self,
        account_id: AccountId,
        kind: CounterKind,
    ) -> Result<Vec<CountEntry>>;
}

/// Network reachability check consulted before remote reads.
pub trait Connectivity: Send + Sync {
    /// Returns true if the server is believed reachable.
    fn is_reachable(&self) -> bool;
}

/// A [`Connectivity`] that always reports the network as reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_reachable(&self) -> bool {
        true
    }
}

/// Contacts synchronization, triggered by event pages.
#[async_trait]
pub trait ContactsRefresher: Send + Sync {
    /// Resynchronizes the account's contacts.
    async fn refresh_contacts(&self, account_id: AccountId) -> Result<()>;
}

/// A [`ContactsRefresher`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContacts;

#[async_trait]
impl ContactsRefresher for NoContacts {
    async fn refresh_contacts(&self, _account_id: AccountId) -> Result<()> {
        Ok(())
    }
}

/// Outbound queue replicating local mutations to the server.
#[async_trait]
pub trait ActionQueue: Send + Sync {
    /// Queues `action` for the account.
    async fn enqueue(&self, account_id: AccountId, action: RemoteAction) -> Result<()>;
}
