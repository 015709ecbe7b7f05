//! Table configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::model::Row;

/// Transform applied to every raw row before it is committed.
///
/// Must be pure. When set, table headers are derived from the transformed
/// row's own columns instead of the configured select columns, and each raw
/// row's `id` is re-attached to the transformed row.
pub type RowTransform = Arc<dyn Fn(&Row) -> Row + Send + Sync>;

const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
const DEFAULT_DELETE_PROMPT: &str = "Are you sure?";

/// Configuration for a [`RemoteTable`](crate::RemoteTable).
///
/// Immutable once the table is built; in particular the endpoint cannot be
/// re-assigned over the table's lifetime.
///
/// # Example
///
/// ```
/// use tablefeed_lib::TableConfig;
///
/// let config = TableConfig::new("items", &["name", "price"])
///     .static_filter("active,=,true")
///     .page_size(25)
///     .deletable(true);
/// ```
#[derive(Clone)]
pub struct TableConfig {
    pub(crate) endpoint: String,
    pub(crate) select_columns: Vec<String>,
    pub(crate) static_filter: Option<String>,
    pub(crate) page_size: usize,
    pub(crate) deletable: bool,
    pub(crate) delete_prompt: String,
    pub(crate) row_transform: Option<RowTransform>,
    pub(crate) debounce: Duration,
}

impl TableConfig {
    /// Creates a configuration for the given endpoint and select columns.
    pub fn new(endpoint: impl Into<String>, select_columns: &[&str]) -> Self {
        Self {
            endpoint: endpoint.into(),
            select_columns: select_columns.iter().map(|s| (*s).to_string()).collect(),
            static_filter: None,
            page_size: DEFAULT_PAGE_SIZE,
            deletable: false,
            delete_prompt: DEFAULT_DELETE_PROMPT.to_string(),
            row_transform: None,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Sets a pre-built filter clause ANDed ahead of all dynamic filters.
    pub fn static_filter(mut self, clause: impl Into<String>) -> Self {
        self.static_filter = Some(clause.into());
        self
    }

    /// Sets the initial page size. Default is 10.
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Permits row deletion. Default is `false`.
    pub fn deletable(mut self, deletable: bool) -> Self {
        self.deletable = deletable;
        self
    }

    /// Sets the confirmation message shown before a delete.
    pub fn delete_prompt(mut self, message: impl Into<String>) -> Self {
        self.delete_prompt = message.into();
        self
    }

    /// Sets the row transform.
    pub fn row_transform(mut self, transform: impl Fn(&Row) -> Row + Send + Sync + 'static) -> Self {
        self.row_transform = Some(Arc::new(transform));
        self
    }

    /// Sets the filter debounce window. Default is 500 ms.
    pub fn debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Returns the endpoint identifier.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the configured select columns.
    pub fn select_columns(&self) -> &[String] {
        &self.select_columns
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("endpoint must not be empty".to_string());
        }
        if self.select_columns.is_empty() {
            return Err("select_columns must not be empty".to_string());
        }
        if self.page_size == 0 {
            return Err("page_size must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl fmt::Debug for TableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableConfig")
            .field("endpoint", &self.endpoint)
            .field("select_columns", &self.select_columns)
            .field("static_filter", &self.static_filter)
            .field("page_size", &self.page_size)
            .field("deletable", &self.deletable)
            .field("debounce", &self.debounce)
            .field("row_transform", &self.row_transform.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TableConfig::new("items", &["name"]);
        assert_eq!(config.page_size, 10);
        assert!(!config.deletable);
        assert_eq!(config.debounce, Duration::from_millis(500));
    }

    #[test]
    fn test_validate_rejects_empty_select() {
        let config = TableConfig::new("items", &[]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let config = TableConfig::new("items", &["name"]).page_size(0);
        assert!(config.validate().is_err());
    }
}
