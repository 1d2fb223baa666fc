//! In-process cursor storage.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{CursorError, CursorResult, CursorStore};
use crate::AccountId;

/// [`CursorStore`] kept in memory. Useful for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    entries: Mutex<HashMap<AccountId, String>>,
}

impl MemoryCursorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CursorStore for MemoryCursorStore {
    fn read(&self, account_id: AccountId) -> CursorResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| CursorError::Poisoned)?;
        Ok(entries.get(&account_id).cloned())
    }

    fn write(&self, account_id: AccountId, value: &str) -> CursorResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CursorError::Poisoned)?;
        entries.insert(account_id, value.to_string());
        Ok(())
    }

    fn clear(&self, account_id: AccountId) -> CursorResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CursorError::Poisoned)?;
        entries.remove(&account_id);
        Ok(())
    }
}
