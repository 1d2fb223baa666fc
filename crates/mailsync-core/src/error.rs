//! Error types for the sync core.

use thiserror::Error;

/// Errors that can occur in sync and cache operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote call failed before the server produced an answer.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-OK response code.
    #[error("API error {code}: {message}")]
    Api {
        /// Response code reported by the server.
        code: u32,
        /// Server-provided error text.
        message: String,
    },

    /// A conversation referenced by an operation is not in the local store.
    #[error("Conversation not found: {0}")]
    NotFound(String),

    /// The operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// The network is unreachable.
    #[error("No network connectivity")]
    Offline,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event cursor storage error.
    #[error("Cursor storage error: {0}")]
    Cursor(#[from] crate::cursor::CursorError),
}

impl Error {
    /// Returns true if this error represents cancellation rather than failure.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Message suitable for surfacing in a [`crate::DataResult::Error`].
    ///
    /// Server and transport failures carry their own text verbatim.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Transport(message) | Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
