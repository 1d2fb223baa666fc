//! Domain models for conversations, messages, labels and counters.

mod conversation;
mod counter;
mod label;
mod message;
mod result;

pub use conversation::{Conversation, ConversationId, Correspondent, LabelContext};
pub use counter::{CounterKind, UnreadCounter};
pub use label::{Label, LabelKind, Location, system_labels};
pub use message::{Message, MessageId};
pub use result::{ActionResult, DataResult, ResponseSource};
