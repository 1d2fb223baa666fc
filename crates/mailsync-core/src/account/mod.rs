//! Account identity and session lifecycle.

mod model;
mod session;

pub use model::AccountId;
pub use session::{AccountSession, SessionManager, SyncPhase};
