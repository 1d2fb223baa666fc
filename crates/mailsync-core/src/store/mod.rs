//! Persisted mailbox state.
//!
//! All writes go through [`WriteBatch`], committed in a single transaction.
//! Every commit publishes [`StoreChange`] notifications that drive live
//! observations.

mod batch;
mod repository;

pub use batch::{StoreOp, WriteBatch};
pub use repository::{MailboxStore, PendingAction};

use std::collections::BTreeSet;

use crate::AccountId;
use crate::model::{ConversationId, CounterKind};

/// A committed change to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// Conversations or their messages changed.
    Conversations {
        /// Owning account.
        account_id: AccountId,
        /// Conversations touched by the commit.
        ids: BTreeSet<ConversationId>,
    },
    /// An unread-counter table was replaced.
    Counters {
        /// Owning account.
        account_id: AccountId,
        /// Replaced kind.
        kind: CounterKind,
    },
    /// The label registry changed.
    Labels {
        /// Owning account.
        account_id: AccountId,
    },
    /// The account's mailbox was wiped.
    Reset {
        /// Owning account.
        account_id: AccountId,
    },
}

impl StoreChange {
    /// Account the change belongs to.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        match self {
            Self::Conversations { account_id, .. }
            | Self::Counters { account_id, .. }
            | Self::Labels { account_id }
            | Self::Reset { account_id } => *account_id,
        }
    }

    /// Returns true if any conversation of the account may have changed.
    #[must_use]
    pub fn touches_conversations(&self, account_id: AccountId) -> bool {
        self.account_id() == account_id
            && matches!(self, Self::Conversations { .. } | Self::Reset { .. })
    }

    /// Returns true if the given conversation may have changed.
    #[must_use]
    pub fn touches_conversation(&self, account_id: AccountId, id: &ConversationId) -> bool {
        if self.account_id() != account_id {
            return false;
        }
        match self {
            Self::Conversations { ids, .. } => ids.contains(id),
            Self::Reset { .. } => true,
            _ => false,
        }
    }

    /// Returns true if counters of `kind` may have changed.
    #[must_use]
    pub fn touches_counters(&self, account_id: AccountId, kind: CounterKind) -> bool {
        if self.account_id() != account_id {
            return false;
        }
        match self {
            Self::Counters { kind: changed, .. } => *changed == kind,
            Self::Reset { .. } => true,
            _ => false,
        }
    }
}
