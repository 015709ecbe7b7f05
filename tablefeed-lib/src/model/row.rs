//! Dynamic row records.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// A single table row: an ordered mapping from column name to value.
///
/// Rows are plain JSON objects as the backend returns them; column order is
/// preserved because table headers are derived from it. The `id` column is
/// always requested and identifies the row for deletion.
///
/// # Example
///
/// ```
/// use tablefeed_lib::model::Row;
/// use serde_json::json;
///
/// let row = Row::new().set("id", json!(7)).set("name", json!("Bob"));
/// assert_eq!(row.id(), Some(&json!(7)));
/// assert_eq!(row.columns().collect::<Vec<_>>(), vec!["id", "name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: Map<String, Value>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `column`, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Returns the row's `id` value, if present.
    pub fn id(&self) -> Option<&Value> {
        self.fields.get("id")
    }

    /// Sets a column value (builder pattern).
    pub fn set(mut self, column: impl Into<String>, value: Value) -> Self {
        self.fields.insert(column.into(), value);
        self
    }

    /// Inserts a column value.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.fields.insert(column.into(), value);
    }

    /// Iterates column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Row {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// The committed result of one fetch cycle: the page of rows plus the header
/// list derived from their shape.
///
/// Replaced wholesale on every fetch, never patched in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    /// Rows in backend order.
    pub rows: Vec<Row>,
    /// Ordered column names to render.
    pub headers: Vec<String>,
}

impl RowSet {
    /// Creates an empty row set with the given headers.
    pub fn empty(headers: Vec<String>) -> Self {
        Self {
            rows: Vec::new(),
            headers,
        }
    }

    /// Returns `true` when the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
