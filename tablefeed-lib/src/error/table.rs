//! Controller error types.

use super::SourceError;

/// Errors surfaced by [`RemoteTable`](crate::RemoteTable) operations.
///
/// None of these are fatal: every failure leaves the controller in its
/// last-known-good state, ready to retry via
/// [`reload_now`](crate::RemoteTable::reload_now). The controller never
/// retries on its own.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A count/list/delete request against the data source failed.
    #[error("data source error: {0}")]
    Source(#[from] SourceError),

    /// Deletion was attempted while the table is not deletable.
    #[error("row deletion is not enabled for this table")]
    PermissionDenied,

    /// The data source refused the deletion.
    #[error("delete rejected by data source: {}", message.as_deref().unwrap_or("no reason given"))]
    DeleteRejected {
        /// Reason reported by the data source, if any.
        message: Option<String>,
    },

    /// The row handed to `delete_row` carries no `id` field.
    #[error("row has no id field")]
    MissingId,

    /// The table configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TableError {
    /// Returns `true` when the failure came from the data source and a retry
    /// could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source(e) => e.is_retryable(),
            _ => false,
        }
    }
}
