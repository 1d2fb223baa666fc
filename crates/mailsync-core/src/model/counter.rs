//! Unread counters per label.

use serde::{Deserialize, Serialize};

use crate::AccountId;
use crate::remote::CountEntry;

/// Which entity a counter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    /// Per-message counters.
    Messages,
    /// Per-conversation counters.
    Conversations,
}

impl CounterKind {
    /// String form used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Conversations => "conversations",
        }
    }
}

/// Number of unread items under one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCounter {
    /// Owning account.
    pub account_id: AccountId,
    /// Counter kind.
    pub kind: CounterKind,
    /// Label the counter belongs to.
    pub label_id: String,
    /// Unread count.
    pub count: u32,
}

impl UnreadCounter {
    /// Builds counters from a server count listing.
    #[must_use]
    pub fn from_entries(account_id: AccountId, kind: CounterKind, entries: &[CountEntry]) -> Vec<Self> {
        entries
            .iter()
            .map(|entry| Self {
                account_id,
                kind,
                label_id: entry.label_id.clone(),
                count: entry.unread,
            })
            .collect()
    }
}
