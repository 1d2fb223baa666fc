//! # mailsync-core
//!
//! Incremental mailbox synchronization for mail clients.
//!
//! This crate provides:
//! - Per-account event log catch-up against a persisted cursor
//! - A local `SQLite` mailbox store with change notifications
//! - Offline-first conversation and unread counter observations
//! - Optimistic mutations (read, star, label, move, delete) queued for the server
//! - Per-account sessions and a single background sync worker

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod cache;
pub mod config;
pub mod cursor;
mod error;
pub mod model;
pub mod remote;
pub mod store;
pub mod sync;

pub use account::{AccountId, AccountSession, SessionManager, SyncPhase};
pub use cache::{ConversationCache, Observation, UnreadCounterCache};
pub use config::SyncConfig;
pub use cursor::{CursorError, CursorStore, EventCursor, KeyringCursorStore, MemoryCursorStore};
pub use error::{Error, Result};
pub use model::{
    ActionResult, Conversation, ConversationId, CounterKind, DataResult, Location, Message,
    MessageId, ResponseSource, UnreadCounter,
};
pub use remote::{ActionQueue, Connectivity, ContactsRefresher, MailApi, RemoteAction};
pub use store::{MailboxStore, StoreChange};
pub use sync::{DrainStats, EventSyncEngine, SyncHandle, SyncReport, SyncWorker};
