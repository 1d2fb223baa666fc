//! Results delivered to observers and returned by mutations.

/// Where a [`DataResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// The persisted store.
    Local,
    /// The server.
    Remote,
}

/// One item of an observation stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataResult<T> {
    /// A value.
    Success {
        /// Origin of the value.
        source: ResponseSource,
        /// The value.
        value: T,
    },
    /// A failure that did not end the stream.
    Error {
        /// Where the failure happened.
        source: ResponseSource,
        /// Failure text.
        message: String,
    },
    /// Work is in progress at `source`.
    Processing {
        /// Where the work is happening.
        source: ResponseSource,
    },
}

impl<T> DataResult<T> {
    /// A value read from the store.
    pub const fn local(value: T) -> Self {
        Self::Success {
            source: ResponseSource::Local,
            value,
        }
    }

    /// A value confirmed by the server.
    pub const fn remote(value: T) -> Self {
        Self::Success {
            source: ResponseSource::Remote,
            value,
        }
    }

    /// A remote failure.
    pub fn remote_error(message: impl Into<String>) -> Self {
        Self::Error {
            source: ResponseSource::Remote,
            message: message.into(),
        }
    }

    /// A local failure.
    pub fn local_error(message: impl Into<String>) -> Self {
        Self::Error {
            source: ResponseSource::Local,
            message: message.into(),
        }
    }

    /// Origin of this item.
    pub const fn source(&self) -> ResponseSource {
        match self {
            Self::Success { source, .. } | Self::Error { source, .. } | Self::Processing { source } => {
                *source
            }
        }
    }

    /// The carried value, if any.
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns true for error items.
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Outcome of a batch mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    /// Every id was applied and the remote action was queued.
    Success,
    /// At least one id could not be applied.
    Error,
}
