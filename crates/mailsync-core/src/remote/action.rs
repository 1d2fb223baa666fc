//! Remote actions queued for replication after a local mutation.

use serde::{Deserialize, Serialize};

use crate::model::ConversationId;

/// A mutation the server still has to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteAction {
    /// Mark conversations read.
    MarkRead {
        /// Affected conversations.
        conversation_ids: Vec<ConversationId>,
    },

    /// Mark the latest message of each conversation in a location unread.
    MarkUnread {
        /// Affected conversations.
        conversation_ids: Vec<ConversationId>,
        /// Label id of the location the user was viewing.
        location_id: String,
    },

    /// Apply a label (starring applies the starred label).
    Label {
        /// Affected conversations.
        conversation_ids: Vec<ConversationId>,
        /// Label to add.
        label_id: String,
    },

    /// Remove a label.
    Unlabel {
        /// Affected conversations.
        conversation_ids: Vec<ConversationId>,
        /// Label to remove.
        label_id: String,
    },

    /// Move into an exclusive folder.
    Move {
        /// Affected conversations.
        conversation_ids: Vec<ConversationId>,
        /// Destination folder.
        folder_id: String,
    },

    /// Delete the messages found in a folder.
    Delete {
        /// Affected conversations.
        conversation_ids: Vec<ConversationId>,
        /// Folder being viewed.
        folder_id: String,
    },
}

impl RemoteAction {
    /// Get the action type string for database storage
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        match self {
            Self::MarkRead { .. } => "mark_read",
            Self::MarkUnread { .. } => "mark_unread",
            Self::Label { .. } => "label",
            Self::Unlabel { .. } => "unlabel",
            Self::Move { .. } => "move",
            Self::Delete { .. } => "delete",
        }
    }

    /// Get the conversations this action operates on
    #[must_use]
    pub fn conversation_ids(&self) -> &[ConversationId] {
        match self {
            Self::MarkRead { conversation_ids }
            | Self::MarkUnread {
                conversation_ids, ..
            }
            | Self::Label {
                conversation_ids, ..
            }
            | Self::Unlabel {
                conversation_ids, ..
            }
            | Self::Move {
                conversation_ids, ..
            }
            | Self::Delete {
                conversation_ids, ..
            } => conversation_ids,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_serialization() {
        let action = RemoteAction::Label {
            conversation_ids: vec![ConversationId::new("c1")],
            label_id: "10".to_string(),
        };

        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"type":"label","conversation_ids":["c1"],"label_id":"10"}"#);
        assert_eq!(action.type_str(), "label");
        assert_eq!(action.conversation_ids().len(), 1);
    }
}
