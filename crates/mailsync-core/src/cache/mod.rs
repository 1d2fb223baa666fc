//! Offline-first reactive reads and optimistic mutations.
//!
//! Observations emit what the store holds first, then what the server
//! returns. Mutations are applied to the store immediately and replicated
//! through the [`crate::remote::ActionQueue`].

mod conversations;
mod counters;
pub mod mutation;
mod observation;

pub use conversations::{ConversationCache, ConversationResult, ConversationsResult};
pub use counters::{CountersResult, UnreadCounterCache};
pub use observation::{Emitter, Observation};
