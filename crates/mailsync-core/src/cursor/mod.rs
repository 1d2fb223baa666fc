//! Persistent per-account event cursor.
//!
//! The cursor is the id of the last event page fully applied to the store.
//! An empty stored value marks a cursor that was invalidated and must be
//! rebuilt by a full refresh.

mod keyring;
mod memory;

pub use self::keyring::{DEFAULT_SERVICE_NAME, KeyringCursorStore};
pub use memory::MemoryCursorStore;

use std::sync::Arc;

use crate::AccountId;

/// Error type for cursor storage operations.
#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] ::keyring::Error),

    /// The in-process store lock was poisoned.
    #[error("Cursor store lock poisoned")]
    Poisoned,
}

/// Result type for cursor operations.
pub type CursorResult<T> = std::result::Result<T, CursorError>;

/// Secure key-value storage for event cursors, one entry per account.
pub trait CursorStore: Send + Sync {
    /// Reads the stored cursor value, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn read(&self, account_id: AccountId) -> CursorResult<Option<String>>;

    /// Stores `value` as the account's cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn write(&self, account_id: AccountId, value: &str) -> CursorResult<()>;

    /// Removes the account's cursor entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn clear(&self, account_id: AccountId) -> CursorResult<()>;
}

/// Runs `call` against `store` on the blocking thread pool.
///
/// Keyring backends talk to the platform secret service synchronously.
pub(crate) async fn blocking<T, F>(store: &Arc<dyn CursorStore>, call: F) -> crate::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn CursorStore) -> CursorResult<T> + Send + 'static,
{
    let store = Arc::clone(store);
    let outcome = tokio::task::spawn_blocking(move || call(store.as_ref()))
        .await
        .map_err(std::io::Error::from)?;
    Ok(outcome?)
}

/// An account's event cursor as read from a [`CursorStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCursor {
    /// Owning account.
    pub account_id: AccountId,
    /// Raw stored value. `Some("")` is the invalidation sentinel.
    pub value: Option<String>,
}

impl EventCursor {
    /// Loads the cursor for `account_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn load(store: &dyn CursorStore, account_id: AccountId) -> CursorResult<Self> {
        Ok(Self {
            account_id,
            value: store.read(account_id)?,
        })
    }

    /// Position to resume from, treating the empty sentinel as absent.
    #[must_use]
    pub fn position(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }

    /// Returns true if a full refresh is required before reading events.
    #[must_use]
    pub fn needs_bootstrap(&self) -> bool {
        self.position().is_none()
    }

    /// Returns true if the cursor was explicitly invalidated.
    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.value.as_deref() == Some("")
    }
}
