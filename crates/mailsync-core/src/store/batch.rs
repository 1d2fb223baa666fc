//! Ordered store writes applied in one transaction.

use crate::model::{
    Conversation, ConversationId, CounterKind, Label, Message, MessageId, UnreadCounter,
};

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// Remove every conversation, message and counter of the account.
    /// The label registry is kept.
    ClearMailbox,
    /// Insert or replace a conversation.
    UpsertConversation(Conversation),
    /// Remove a conversation and its messages.
    DeleteConversation(ConversationId),
    /// Insert or replace a message.
    UpsertMessage(Message),
    /// Remove a message.
    DeleteMessage(MessageId),
    /// Insert or replace a registry label.
    UpsertLabel(Label),
    /// Remove a registry label.
    DeleteLabel(String),
    /// Replace every counter of `kind` with `counters`.
    ReplaceCounters {
        /// Counter kind.
        kind: CounterKind,
        /// New full set.
        counters: Vec<UnreadCounter>,
    },
}

/// Writes applied in order, atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<StoreOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a write.
    pub fn push(&mut self, op: StoreOp) {
        self.ops.push(op);
    }

    /// Builder form of [`Self::push`].
    #[must_use]
    pub fn with(mut self, op: StoreOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Number of writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if there is nothing to write.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The writes, in application order.
    #[must_use]
    pub fn ops(&self) -> &[StoreOp] {
        &self.ops
    }
}

impl Extend<StoreOp> for WriteBatch {
    fn extend<T: IntoIterator<Item = StoreOp>>(&mut self, iter: T) {
        self.ops.extend(iter);
    }
}

impl FromIterator<StoreOp> for WriteBatch {
    fn from_iter<T: IntoIterator<Item = StoreOp>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for WriteBatch {
    type Item = StoreOp;
    type IntoIter = std::vec::IntoIter<StoreOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
