//! Event-log synchronization.
//!
//! [`EventSyncEngine`] walks the server event log from the stored cursor,
//! committing each page to the store before advancing the cursor.
//! [`SyncWorker`] owns the engine and serializes all catch-up work.

mod engine;
pub mod staging;
mod worker;

pub use engine::{DEFAULT_BOOTSTRAP_PAGE_SIZE, DrainStats, EventSyncEngine, SyncReport};
pub use worker::{SyncHandle, SyncWorker};
