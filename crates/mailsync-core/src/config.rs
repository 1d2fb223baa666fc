//! Sync configuration.
//!
//! Stored as JSON under the platform config directory. A missing file means
//! defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cursor::DEFAULT_SERVICE_NAME;
use crate::sync::DEFAULT_BOOTSTRAP_PAGE_SIZE;
use crate::{Error, Result};

/// Application directory name under the platform config and data dirs.
const APP_DIR: &str = "mailsync";

/// Settings for the sync core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// `SQLite` database file.
    pub database_path: PathBuf,
    /// Keyring service name for cursor entries.
    pub keyring_service: String,
    /// Conversations fetched by a full refresh and per list page.
    pub page_size: u32,
    /// Seconds between background drains of every account, 0 to disable.
    pub poll_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            database_path: data_dir.join("mailsync.db"),
            keyring_service: DEFAULT_SERVICE_NAME.to_string(),
            page_size: DEFAULT_BOOTSTRAP_PAGE_SIZE,
            poll_interval_secs: 60,
        }
    }
}

impl SyncConfig {
    /// Default location of the config file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }

    /// Loads the config from [`Self::default_path`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()).await
    }

    /// Loads the config from `path`, falling back to defaults if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the config to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        info!("Config saved to {:?}", path);
        Ok(())
    }

    /// Checks values that would make the engine misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be greater than 0".to_string()));
        }
        if self.keyring_service.trim().is_empty() {
            return Err(Error::Config("keyring_service must not be empty".to_string()));
        }
        Ok(())
    }

    /// Background poll period, if enabled.
    #[must_use]
    pub const fn poll_interval(&self) -> Option<Duration> {
        if self.poll_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.poll_interval_secs))
        }
    }

    /// Database path as a string for [`crate::MailboxStore::new`].
    #[must_use]
    pub fn database_path_str(&self) -> String {
        self.database_path.to_string_lossy().into_owned()
    }
}
