//! Conversation model and per-label contexts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::AccountId;

/// Unique identifier for a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Create a new conversation ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Sender or recipient of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correspondent {
    /// Display name.
    pub name: String,
    /// Email address.
    pub address: String,
}

impl Correspondent {
    /// Create a new correspondent.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Per-label counters of a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelContext {
    /// Label this context belongs to.
    pub label_id: String,
    /// Unread messages carrying the label.
    pub num_unread: u32,
    /// Messages carrying the label.
    pub num_messages: u32,
    /// Latest message time under the label.
    pub time: i64,
    /// Total size of messages under the label.
    pub size: i64,
    /// Attachments under the label.
    pub num_attachments: u32,
}

/// A thread of related messages.
///
/// Sorted by `order` descending in list views. `messages` is only populated
/// when a single conversation is loaded together with its members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conversation {
    /// Conversation id.
    pub id: ConversationId,
    /// Owning account.
    pub account_id: AccountId,
    /// Subject line.
    pub subject: String,
    /// Distinct senders.
    pub senders: Vec<Correspondent>,
    /// Distinct recipients.
    pub recipients: Vec<Correspondent>,
    /// Total messages.
    pub num_messages: u32,
    /// Unread messages.
    pub num_unread: u32,
    /// Total attachments.
    pub num_attachments: u32,
    /// Expiration timestamp, 0 for never.
    pub expiration_time: i64,
    /// Total size in bytes.
    pub size: i64,
    /// Label id to context.
    pub labels: BTreeMap<String, LabelContext>,
    /// Sort key.
    pub order: i64,
    /// Member messages, when joined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new(account_id: AccountId, id: impl Into<String>) -> Self {
        Self {
            id: ConversationId::new(id),
            account_id,
            ..Self::default()
        }
    }

    /// Returns true if the conversation has a context for `label_id`.
    #[must_use]
    pub fn has_label(&self, label_id: &str) -> bool {
        self.labels.contains_key(label_id)
    }

    /// Context for `label_id`, if any.
    #[must_use]
    pub fn context(&self, label_id: &str) -> Option<&LabelContext> {
        self.labels.get(label_id)
    }

    /// Returns the conversation with `messages` joined.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Builder method to add a label context.
    #[must_use]
    pub fn with_context(mut self, context: LabelContext) -> Self {
        self.labels.insert(context.label_id.clone(), context);
        self
    }

    /// Returns the conversation without its joined messages.
    #[must_use]
    pub fn without_messages(mut self) -> Self {
        self.messages = None;
        self
    }

    /// Context for a label that now covers every message of the conversation.
    #[must_use]
    pub fn full_context(&self, label_id: &str, time: i64) -> LabelContext {
        LabelContext {
            label_id: label_id.to_string(),
            num_unread: self.num_unread,
            num_messages: self.num_messages,
            time,
            size: self.size,
            num_attachments: self.num_attachments,
        }
    }

    /// Latest time across all contexts.
    #[must_use]
    pub fn latest_time(&self) -> i64 {
        self.labels.values().map(|c| c.time).max().unwrap_or_default()
    }
}
