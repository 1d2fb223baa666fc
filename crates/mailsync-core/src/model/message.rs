//! Message model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::conversation::{ConversationId, Correspondent};
use super::label::{Location, system_labels};

/// Unique identifier for a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Create a new message ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single message belonging to a conversation.
///
/// Location and starred state are derived from `label_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Message id.
    pub id: MessageId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Subject line.
    pub subject: String,
    /// Whether the message is unread.
    pub unread: bool,
    /// Sender.
    pub sender: Correspondent,
    /// To/Cc/Bcc recipients.
    pub recipients: Vec<Correspondent>,
    /// Unix timestamp (seconds).
    pub time: i64,
    /// Size in bytes.
    pub size: i64,
    /// Number of attachments.
    pub num_attachments: u32,
    /// Unix timestamp after which the message expires, 0 for never.
    pub expiration_time: i64,
    /// Whether the user replied.
    pub is_replied: bool,
    /// Whether the user replied to all.
    pub is_replied_all: bool,
    /// Whether the user forwarded it.
    pub is_forwarded: bool,
    /// Labels and folders applied to the message.
    pub label_ids: BTreeSet<String>,
}

impl Message {
    /// Create a message with the given ids and defaults elsewhere.
    pub fn new(id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(id),
            conversation_id: ConversationId::new(conversation_id),
            ..Self::default()
        }
    }

    /// The view this message appears in.
    #[must_use]
    pub fn location(&self) -> Location {
        Location::derive(&self.label_ids)
    }

    /// Starred iff the starred label is present.
    #[must_use]
    pub fn is_starred(&self) -> bool {
        self.has_label(system_labels::STARRED)
    }

    /// Returns true if the message carries `label_id`.
    #[must_use]
    pub fn has_label(&self, label_id: &str) -> bool {
        self.label_ids.contains(label_id)
    }

    /// Returns the message with `labels` added.
    #[must_use]
    pub fn with_labels_added<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_ids.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Returns the message with `labels` removed.
    #[must_use]
    pub fn with_labels_removed<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for label in labels {
            self.label_ids.remove(label.as_ref());
        }
        self
    }

    /// Returns the message with the given read state.
    #[must_use]
    pub const fn with_read(mut self, read: bool) -> Self {
        self.unread = !read;
        self
    }

    /// Builder method to set the timestamp.
    #[must_use]
    pub const fn with_time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }
}
