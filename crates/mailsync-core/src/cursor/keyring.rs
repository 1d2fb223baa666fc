//! Event cursor storage in the system keyring.
//!
//! Uses the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::{debug, warn};

use super::{CursorResult, CursorStore};
use crate::AccountId;
use crate::config::SyncConfig;

/// Default service name used for keyring entries.
pub const DEFAULT_SERVICE_NAME: &str = "mailsync";

/// Entry type identifier for event cursors.
const CURSOR_CREDENTIAL: &str = "event_cursor";

/// [`CursorStore`] backed by the system keyring.
#[derive(Debug, Clone)]
pub struct KeyringCursorStore {
    service: String,
}

impl KeyringCursorStore {
    /// Create a store that writes entries under `service`.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Create a store under the configured keyring service.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.keyring_service.clone())
    }

    /// Generates the keyring entry key for an account's cursor.
    fn cursor_key(&self, account_id: AccountId) -> String {
        format!("{}_{CURSOR_CREDENTIAL}_{}", self.service, account_id.0)
    }

    fn entry(&self, account_id: AccountId) -> CursorResult<Entry> {
        Ok(Entry::new(&self.service, &self.cursor_key(account_id))?)
    }
}

impl Default for KeyringCursorStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl CursorStore for KeyringCursorStore {
    fn read(&self, account_id: AccountId) -> CursorResult<Option<String>> {
        match self.entry(account_id)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => {
                debug!("No event cursor found for account {}", account_id.0);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, account_id: AccountId, value: &str) -> CursorResult<()> {
        self.entry(account_id)?.set_password(value)?;
        debug!("Stored event cursor for account {}", account_id.0);
        Ok(())
    }

    fn clear(&self, account_id: AccountId) -> CursorResult<()> {
        match self.entry(account_id)?.delete_credential() {
            Ok(()) => {
                debug!("Deleted event cursor for account {}", account_id.0);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No event cursor to delete for account {}", account_id.0);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete event cursor: {e}");
                Err(e.into())
            }
        }
    }
}
