//! Data source and confirmation collaborators.

mod http;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;
use crate::model::Row;

pub use http::HttpSource;

/// Response to a delete request.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResponse {
    /// Whether the deletion went through.
    pub success: bool,
    /// Optional reason, mostly for rejections.
    #[serde(default)]
    pub message: Option<String>,
}

/// An abstract remote collection the table reads from.
///
/// Implementations must be stateless and reentrant: the controller keeps
/// multiple requests outstanding (count and list of one cycle run
/// concurrently, and superseded cycles are not cancelled).
///
/// `endpoint` is the opaque collection identifier from the table
/// configuration; `query`/`where_expression` follow the grammar produced by
/// [`crate::query`].
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Returns the number of rows matching `where_expression` (empty string
    /// means unfiltered).
    async fn count(&self, endpoint: &str, where_expression: &str) -> Result<u64, SourceError>;

    /// Returns one page of rows for the given query string (starts with `?`).
    async fn list(&self, endpoint: &str, query: &str) -> Result<Vec<Row>, SourceError>;

    /// Deletes the row with the given id.
    async fn delete(&self, endpoint: &str, id: &Value) -> Result<DeleteResponse, SourceError>;
}

/// Asks the user to confirm a destructive action.
///
/// Consulted synchronously before every delete request goes out.
pub trait ConfirmPrompt: Send + Sync {
    /// Returns `true` to proceed, `false` to decline.
    fn confirm(&self, message: &str) -> bool;
}

/// A [`ConfirmPrompt`] that approves everything.
///
/// This is the default when no prompt is configured; hosts with a UI should
/// supply a real one.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl ConfirmPrompt for AutoConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}
