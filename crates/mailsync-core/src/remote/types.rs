//! Request and response shapes exchanged with the mail API.

use serde::{Deserialize, Serialize};

use crate::model::{Conversation, ConversationId, CounterKind, Label, Message, MessageId};
use crate::{AccountId, Error, Result};

/// Response code the server uses for success.
pub const RESPONSE_CODE_OK: u32 = 1000;

fn ensure_ok(code: u32, error: Option<&str>) -> Result<()> {
    if code == RESPONSE_CODE_OK {
        Ok(())
    } else {
        Err(Error::Api {
            code,
            message: error.unwrap_or("Unexpected response code").to_string(),
        })
    }
}

/// What happened to an entity in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// The entity was removed.
    Delete,
    /// The entity was created.
    Create,
    /// The entity changed.
    Update,
}

/// One change inside an event page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEntry {
    /// A conversation changed.
    Conversation {
        /// Conversation id.
        id: ConversationId,
        /// Kind of change.
        action: EventAction,
        /// New state for creates and updates.
        #[serde(default)]
        conversation: Option<Conversation>,
    },
    /// A message changed.
    Message {
        /// Message id.
        id: MessageId,
        /// Kind of change.
        action: EventAction,
        /// New state for creates and updates.
        #[serde(default)]
        message: Option<Message>,
    },
    /// A label or folder changed.
    Label {
        /// Label id.
        id: String,
        /// Kind of change.
        action: EventAction,
        /// New state for creates and updates.
        #[serde(default)]
        label: Option<Label>,
    },
    /// A full unread-count listing.
    Counters {
        /// Counter kind.
        kind: CounterKind,
        /// Every counter of that kind.
        counts: Vec<CountEntry>,
    },
}

/// One page of the server event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPage {
    /// Response code.
    pub code: u32,
    /// Cursor to store once this page is applied.
    pub event_id: String,
    /// Whether another page follows immediately.
    #[serde(default)]
    pub has_more: bool,
    /// Changes in this page.
    #[serde(default)]
    pub entries: Vec<EventEntry>,
    /// The contacts collaborator must resynchronize.
    #[serde(default)]
    pub refresh_contacts: bool,
    /// The local mailbox must be rebuilt from scratch.
    #[serde(default)]
    pub refresh: bool,
    /// Error text for non-OK codes.
    #[serde(default)]
    pub error: Option<String>,
}

impl EventPage {
    /// Converts a non-OK response code into [`Error::Api`].
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not [`RESPONSE_CODE_OK`].
    pub fn ensure_ok(&self) -> Result<()> {
        ensure_ok(self.code, self.error.as_deref())
    }
}

/// The newest event id known to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestEvent {
    /// Response code.
    pub code: u32,
    /// Newest event id.
    pub event_id: String,
    /// Error text for non-OK codes.
    #[serde(default)]
    pub error: Option<String>,
}

impl LatestEvent {
    /// Converts a non-OK response code into [`Error::Api`].
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not [`RESPONSE_CODE_OK`].
    pub fn ensure_ok(&self) -> Result<()> {
        ensure_ok(self.code, self.error.as_deref())
    }
}

/// Parameters of a conversation list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationListParams {
    /// Account to list for.
    pub account_id: AccountId,
    /// Label or location id to filter by.
    pub label_id: String,
    /// Only conversations ordered before this key.
    pub end: Option<i64>,
    /// Maximum conversations to return.
    pub page_size: u32,
}

impl ConversationListParams {
    /// First page of `label_id`.
    pub fn new(account_id: AccountId, label_id: impl Into<String>, page_size: u32) -> Self {
        Self {
            account_id,
            label_id: label_id.into(),
            end: None,
            page_size,
        }
    }
}

/// A page of conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationsPage {
    /// Total conversations under the label on the server.
    pub total: u32,
    /// The page.
    pub conversations: Vec<Conversation>,
}

/// A single conversation with all of its messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDetail {
    /// The conversation.
    pub conversation: Conversation,
    /// Its messages.
    pub messages: Vec<Message>,
}

/// Server-side count of one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    /// Label id.
    pub label_id: String,
    /// Total items.
    pub total: u32,
    /// Unread items.
    pub unread: u32,
}

impl CountEntry {
    /// Create a new count entry.
    pub fn new(label_id: impl Into<String>, total: u32, unread: u32) -> Self {
        Self {
            label_id: label_id.into(),
            total,
            unread,
        }
    }
}
