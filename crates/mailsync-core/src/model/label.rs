//! Labels, folders and the location a message is shown in.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Well-known system label ids.
pub mod system_labels {
    /// Inbox folder.
    pub const INBOX: &str = "0";
    /// Aggregate view of every draft.
    pub const ALL_DRAFTS: &str = "1";
    /// Aggregate view of every sent message.
    pub const ALL_SENT: &str = "2";
    /// Trash folder.
    pub const TRASH: &str = "3";
    /// Spam folder.
    pub const SPAM: &str = "4";
    /// Aggregate view of every message.
    pub const ALL_MAIL: &str = "5";
    /// Archive folder.
    pub const ARCHIVE: &str = "6";
    /// Sent folder.
    pub const SENT: &str = "7";
    /// Drafts folder.
    pub const DRAFTS: &str = "8";
    /// Starred pseudo-label.
    pub const STARRED: &str = "10";

    /// Every system id, in no particular order.
    pub const ALL: [&str; 10] = [
        INBOX, ALL_DRAFTS, ALL_SENT, TRASH, SPAM, ALL_MAIL, ARCHIVE, SENT, DRAFTS, STARRED,
    ];

    /// System ids that behave as exclusive folders.
    pub const FOLDERS: [&str; 6] = [INBOX, TRASH, SPAM, ARCHIVE, SENT, DRAFTS];

    /// Returns true for any system id.
    #[must_use]
    pub fn is_system(label_id: &str) -> bool {
        ALL.contains(&label_id)
    }
}

use system_labels as ids;

/// Whether a label is exclusive (folder) or additive (tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    /// A message sits in at most one folder.
    Folder,
    /// A message may carry any number of labels.
    #[default]
    Label,
}

impl LabelKind {
    /// String form used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Label => "label",
        }
    }

    /// Parses the storage form, treating anything unknown as a plain label.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s == "folder" { Self::Folder } else { Self::Label }
    }
}

/// A user-defined label or folder from the label registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Folder or tag.
    pub kind: LabelKind,
}

impl Label {
    /// Create a new additive label.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: LabelKind::Label,
        }
    }

    /// Create a new exclusive folder.
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: LabelKind::Folder,
        }
    }

    /// Returns true if this label is exclusive.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.kind == LabelKind::Folder
    }
}

/// The view a message appears in, derived from its label set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Inbox.
    Inbox,
    /// Sent folder.
    Sent,
    /// Drafts folder.
    Drafts,
    /// Archive folder.
    Archive,
    /// Trash folder.
    Trash,
    /// Spam folder.
    Spam,
    /// Starred, with no folder label.
    Starred,
    /// Only present in aggregate views.
    AllMail,
    /// A user-defined label.
    Label(String),
}

impl Location {
    /// Derives the location from a label set.
    ///
    /// Precedence is inbox, sent, drafts, archive, trash, spam, starred,
    /// all-mail, then the first custom label. An empty set is the inbox.
    #[must_use]
    pub fn derive(label_ids: &BTreeSet<String>) -> Self {
        let has = |id: &str| label_ids.contains(id);

        if label_ids.is_empty() || has(ids::INBOX) {
            Self::Inbox
        } else if has(ids::SENT) {
            Self::Sent
        } else if has(ids::DRAFTS) {
            Self::Drafts
        } else if has(ids::ARCHIVE) {
            Self::Archive
        } else if has(ids::TRASH) {
            Self::Trash
        } else if has(ids::SPAM) {
            Self::Spam
        } else if has(ids::STARRED) {
            Self::Starred
        } else if has(ids::ALL_MAIL) || has(ids::ALL_SENT) || has(ids::ALL_DRAFTS) {
            Self::AllMail
        } else {
            label_ids
                .iter()
                .find(|id| !ids::is_system(id))
                .map_or(Self::Inbox, |id| Self::Label(id.clone()))
        }
    }

    /// Maps a label id to the location it denotes.
    #[must_use]
    pub fn from_label_id(label_id: &str) -> Self {
        match label_id {
            ids::INBOX => Self::Inbox,
            ids::SENT | ids::ALL_SENT => Self::Sent,
            ids::DRAFTS | ids::ALL_DRAFTS => Self::Drafts,
            ids::ARCHIVE => Self::Archive,
            ids::TRASH => Self::Trash,
            ids::SPAM => Self::Spam,
            ids::STARRED => Self::Starred,
            ids::ALL_MAIL => Self::AllMail,
            other => Self::Label(other.to_string()),
        }
    }

    /// The label id whose context tracks this location.
    #[must_use]
    pub fn label_id(&self) -> &str {
        match self {
            Self::Inbox => ids::INBOX,
            Self::Sent => ids::SENT,
            Self::Drafts => ids::DRAFTS,
            Self::Archive => ids::ARCHIVE,
            Self::Trash => ids::TRASH,
            Self::Spam => ids::SPAM,
            Self::Starred => ids::STARRED,
            Self::AllMail => ids::ALL_MAIL,
            Self::Label(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_empty_set_is_inbox() {
        assert_eq!(Location::derive(&BTreeSet::new()), Location::Inbox);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(Location::derive(&set(&["0", "6", "10"])), Location::Inbox);
        assert_eq!(Location::derive(&set(&["7", "2", "5"])), Location::Sent);
        assert_eq!(Location::derive(&set(&["3", "4"])), Location::Trash);
        assert_eq!(Location::derive(&set(&["10", "5"])), Location::Starred);
        assert_eq!(Location::derive(&set(&["10"])), Location::Starred);
        assert_eq!(Location::derive(&set(&["5", "2"])), Location::AllMail);
    }

    #[test]
    fn test_custom_label_location() {
        assert_eq!(
            Location::derive(&set(&["label-a", "label-b"])),
            Location::Label("label-a".to_string())
        );
        assert_eq!(
            Location::derive(&set(&["6", "label-a"])),
            Location::Archive
        );
    }

    #[test]
    fn test_label_id_round_trip() {
        for location in [
            Location::Inbox,
            Location::Sent,
            Location::Drafts,
            Location::Archive,
            Location::Trash,
            Location::Spam,
            Location::Starred,
            Location::AllMail,
            Location::Label("custom".to_string()),
        ] {
            assert_eq!(Location::from_label_id(location.label_id()), location);
        }
    }

    #[test]
    fn test_label_kind_parse() {
        assert_eq!(LabelKind::parse("folder"), LabelKind::Folder);
        assert_eq!(LabelKind::parse("label"), LabelKind::Label);
        assert_eq!(LabelKind::parse("other"), LabelKind::Label);
        assert!(Label::folder("f1", "Receipts").is_folder());
        assert!(!Label::new("l1", "Work").is_folder());
    }
}
