//! Pure conversation and message transforms behind the cache mutations.

use std::collections::BTreeSet;

use crate::model::{
    Conversation, ConversationId, LabelContext, Location, Message, MessageId, system_labels,
};
use crate::store::{StoreOp, WriteBatch};

/// The rows one mutation writes for a single conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    conversation_id: ConversationId,
    /// Updated conversation, or `None` when it is removed.
    pub conversation: Option<Conversation>,
    /// Messages to upsert.
    pub messages: Vec<Message>,
    /// Messages to remove.
    pub removed_messages: Vec<MessageId>,
}

impl Mutation {
    fn update(conversation: Conversation, messages: Vec<Message>) -> Self {
        Self {
            conversation_id: conversation.id.clone(),
            conversation: Some(conversation),
            messages,
            removed_messages: Vec::new(),
        }
    }

    /// The store writes for this mutation.
    #[must_use]
    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        batch.extend(self.removed_messages.into_iter().map(StoreOp::DeleteMessage));
        batch.extend(self.messages.into_iter().map(StoreOp::UpsertMessage));
        match self.conversation {
            Some(conversation) => batch.push(StoreOp::UpsertConversation(conversation)),
            None => batch.push(StoreOp::DeleteConversation(self.conversation_id)),
        }
        batch
    }
}

fn latest_time(conversation: &Conversation, messages: &[Message]) -> i64 {
    messages
        .iter()
        .map(|m| m.time)
        .max()
        .unwrap_or_else(|| conversation.latest_time())
}

/// Marks every message read and zeroes every unread counter.
#[must_use]
pub fn mark_read(mut conversation: Conversation, messages: Vec<Message>) -> Mutation {
    conversation.num_unread = 0;
    for context in conversation.labels.values_mut() {
        context.num_unread = 0;
    }
    let messages = messages.into_iter().map(|m| m.with_read(true)).collect();
    Mutation::update(conversation, messages)
}

/// Marks the latest message in `location` unread and bumps the counters.
#[must_use]
pub fn mark_unread(
    mut conversation: Conversation,
    messages: Vec<Message>,
    location: &Location,
) -> Mutation {
    let latest = messages
        .iter()
        .filter(|m| m.location() == *location)
        .max_by(|a, b| a.time.cmp(&b.time).then_with(|| a.id.cmp(&b.id)))
        .map(|m| m.id.clone());

    let messages = messages
        .into_iter()
        .filter(|m| Some(&m.id) == latest.as_ref())
        .map(|m| m.with_read(false))
        .collect();

    conversation.num_unread = conversation.num_unread.saturating_add(1);
    if let Some(context) = conversation.labels.get_mut(location.label_id()) {
        context.num_unread = context.num_unread.saturating_add(1).min(context.num_messages);
    }
    Mutation::update(conversation, messages)
}

/// Applies `label_id` to every message and gives it a full context.
#[must_use]
pub fn add_label(conversation: Conversation, messages: Vec<Message>, label_id: &str) -> Mutation {
    let context = conversation.full_context(label_id, latest_time(&conversation, &messages));
    let messages = messages
        .into_iter()
        .map(|m| m.with_labels_added([label_id]))
        .collect();
    Mutation::update(conversation.with_context(context), messages)
}

/// Removes `label_id` from every message and drops its context.
#[must_use]
pub fn remove_label(
    mut conversation: Conversation,
    messages: Vec<Message>,
    label_id: &str,
) -> Mutation {
    conversation.labels.remove(label_id);
    let messages = messages
        .into_iter()
        .map(|m| m.with_labels_removed([label_id]))
        .collect();
    Mutation::update(conversation, messages)
}

/// Moves every message into `folder_id`, leaving all other folders.
///
/// `custom_folders` are registry labels of kind folder.
#[must_use]
pub fn move_to_folder(
    mut conversation: Conversation,
    messages: Vec<Message>,
    folder_id: &str,
    custom_folders: &BTreeSet<String>,
) -> Mutation {
    let is_other_folder = |id: &str| {
        id != folder_id && (system_labels::FOLDERS.contains(&id) || custom_folders.contains(id))
    };

    let removed: BTreeSet<String> = messages
        .iter()
        .flat_map(|m| m.label_ids.iter())
        .chain(conversation.labels.keys())
        .filter(|id| is_other_folder(id))
        .cloned()
        .collect();

    conversation.labels.retain(|id, _| !removed.contains(id));
    let context = conversation.full_context(folder_id, latest_time(&conversation, &messages));
    let messages = messages
        .into_iter()
        .map(|m| m.with_labels_removed(&removed).with_labels_added([folder_id]))
        .collect();
    Mutation::update(conversation.with_context(context), messages)
}

/// Removes the conversation's messages in `folder_id`.
///
/// The folder context decides what leaves the conversation totals, since the
/// store may hold only some of the messages. Messages held locally are
/// deleted and subtracted from their other contexts. The conversation goes
/// away once no message or context is left.
#[must_use]
pub fn delete(mut conversation: Conversation, messages: Vec<Message>, folder_id: &str) -> Mutation {
    let removed: Vec<Message> = messages
        .into_iter()
        .filter(|m| m.has_label(folder_id))
        .collect();
    let removed_ids = removed.iter().map(|m| m.id.clone()).collect();

    let folder = conversation.labels.remove(folder_id).unwrap_or_default();
    let mut gone = LabelContext::default();
    for message in &removed {
        gone.num_messages += 1;
        gone.num_attachments += message.num_attachments;
        gone.size += message.size;
        if message.unread {
            gone.num_unread += 1;
        }
        for label_id in &message.label_ids {
            if let Some(context) = conversation.labels.get_mut(label_id) {
                subtract(
                    context,
                    1,
                    u32::from(message.unread),
                    message.size,
                    message.num_attachments,
                );
            }
        }
    }

    let num_messages = folder.num_messages.max(gone.num_messages);
    let num_unread = folder.num_unread.max(gone.num_unread);
    let size = folder.size.max(gone.size);
    let num_attachments = folder.num_attachments.max(gone.num_attachments);
    conversation.num_messages = conversation.num_messages.saturating_sub(num_messages);
    conversation.num_unread = conversation.num_unread.saturating_sub(num_unread);
    conversation.size = conversation.size.saturating_sub(size).max(0);
    conversation.num_attachments = conversation.num_attachments.saturating_sub(num_attachments);

    // All mail spans every message of the conversation.
    let totals = conversation.full_context(system_labels::ALL_MAIL, 0);
    if let Some(all_mail) = conversation.labels.get_mut(system_labels::ALL_MAIL) {
        *all_mail = LabelContext {
            time: all_mail.time,
            ..totals
        };
    }
    conversation.labels.retain(|_, context| context.num_messages > 0);

    let emptied = conversation.num_messages == 0 || conversation.labels.is_empty();
    Mutation {
        conversation_id: conversation.id.clone(),
        conversation: (!emptied).then_some(conversation),
        messages: Vec::new(),
        removed_messages: removed_ids,
    }
}

fn subtract(context: &mut LabelContext, messages: u32, unread: u32, size: i64, attachments: u32) {
    context.num_messages = context.num_messages.saturating_sub(messages);
    context.num_unread = context.num_unread.saturating_sub(unread);
    context.size = context.size.saturating_sub(size).max(0);
    context.num_attachments = context.num_attachments.saturating_sub(attachments);
}
