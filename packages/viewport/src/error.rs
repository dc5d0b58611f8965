//! Error taxonomy for viewport queries.

use std::time::Duration;

use civic_map_database::DbError;

/// Errors returned by the viewport engine.
///
/// `InvalidBounds` and `InvalidRange` are raised before any store access.
/// `QueryTimeout` and `QueryFailed` come from the store and are safe to
/// retry.
#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    /// Missing, malformed or inverted viewport corners.
    #[error("Invalid bounds: {message}")]
    InvalidBounds {
        /// Description of what went wrong.
        message: String,
    },

    /// `from` is after `to`.
    #[error("Invalid range: {message}")]
    InvalidRange {
        /// Description of what went wrong.
        message: String,
    },

    /// The store did not answer in time.
    #[error("{operation} query timed out after {}ms", timeout.as_millis())]
    QueryTimeout {
        /// Which aggregation was running.
        operation: &'static str,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The store returned an error.
    #[error("{operation} query failed: {source}")]
    QueryFailed {
        /// Which aggregation was running.
        operation: &'static str,
        /// Underlying store error.
        source: DbError,
    },
}

impl ViewportError {
    pub(crate) fn bounds(message: impl Into<String>) -> Self {
        Self::InvalidBounds {
            message: message.into(),
        }
    }

    pub(crate) fn range(message: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Whether the caller sent a malformed request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidBounds { .. } | Self::InvalidRange { .. })
    }
}
