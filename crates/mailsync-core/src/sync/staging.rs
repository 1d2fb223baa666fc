//! Turns event entries into store writes.

use tracing::warn;

use crate::AccountId;
use crate::model::UnreadCounter;
use crate::remote::{EventAction, EventEntry};
use crate::store::{StoreOp, WriteBatch};

/// Stages the writes for one event page, preserving entry order.
///
/// Creates and updates that arrive without a payload are skipped.
#[must_use]
pub fn stage(account_id: AccountId, entries: &[EventEntry]) -> WriteBatch {
    let mut batch = WriteBatch::new();
    for entry in entries {
        if let Some(op) = stage_entry(account_id, entry) {
            batch.push(op);
        }
    }
    batch
}

fn stage_entry(account_id: AccountId, entry: &EventEntry) -> Option<StoreOp> {
    match entry {
        EventEntry::Conversation {
            id,
            action: EventAction::Delete,
            ..
        } => Some(StoreOp::DeleteConversation(id.clone())),
        EventEntry::Conversation {
            id, conversation, ..
        } => match conversation {
            Some(conversation) => {
                let mut conversation = conversation.clone().without_messages();
                conversation.account_id = account_id;
                Some(StoreOp::UpsertConversation(conversation))
            }
            None => {
                warn!("Conversation event {id} has no payload, skipping");
                None
            }
        },
        EventEntry::Message {
            id,
            action: EventAction::Delete,
            ..
        } => Some(StoreOp::DeleteMessage(id.clone())),
        EventEntry::Message { id, message, .. } => {
            if message.is_none() {
                warn!("Message event {id} has no payload, skipping");
            }
            message.clone().map(StoreOp::UpsertMessage)
        }
        EventEntry::Label {
            id,
            action: EventAction::Delete,
            ..
        } => Some(StoreOp::DeleteLabel(id.clone())),
        EventEntry::Label { id, label, .. } => {
            if label.is_none() {
                warn!("Label event {id} has no payload, skipping");
            }
            label.clone().map(StoreOp::UpsertLabel)
        }
        EventEntry::Counters { kind, counts } => Some(StoreOp::ReplaceCounters {
            kind: *kind,
            counters: UnreadCounter::from_entries(account_id, *kind, counts),
        }),
    }
}
