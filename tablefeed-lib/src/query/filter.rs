//! Column filter model.

use std::fmt;

/// A filter value, parsed from raw host input.
///
/// Raw values arrive as strings (they come out of text inputs and pickers).
/// Numeric-looking values are carried as numbers so the backend receives
/// `age,>,30` rather than a quoted string; everything else is passed through
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A finite numeric value.
    Number(f64),
    /// Any value that did not parse as a finite number.
    Text(String),
}

impl FilterValue {
    /// Parses a raw value, keeping it as text when it is not a finite number.
    ///
    /// # Example
    ///
    /// ```
    /// use tablefeed_lib::query::FilterValue;
    ///
    /// assert_eq!(FilterValue::parse("30"), FilterValue::Number(30.0));
    /// assert_eq!(FilterValue::parse("Bob"), FilterValue::Text("Bob".into()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => FilterValue::Number(n),
            _ => FilterValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display drops the trailing ".0" for whole numbers, which is
            // exactly the wire representation the backend expects.
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One active column filter: an operand plus its value.
///
/// Entries are immutable; changing a column's filter replaces the entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    operand: String,
    value: FilterValue,
}

impl FilterEntry {
    /// Creates a new entry.
    pub fn new(operand: impl Into<String>, value: FilterValue) -> Self {
        Self {
            operand: operand.into(),
            value,
        }
    }

    /// Returns the comparison operand (e.g. `=`, `>`, `is null`).
    pub fn operand(&self) -> &str {
        &self.operand
    }

    /// Returns the filter value.
    pub fn value(&self) -> &FilterValue {
        &self.value
    }
}

/// Returns `true` for operands of the `is` / `is not null` family.
///
/// Presence tests carry no meaningful value, so an empty raw value must not
/// clear them the way it clears ordinary comparisons.
pub fn is_presence_operand(operand: &str) -> bool {
    operand.contains("is")
}

/// Insertion-ordered map of column name to [`FilterEntry`].
///
/// Iteration order is first-insertion order: replacing an existing column's
/// filter keeps its position. The query grammar joins fragments in this
/// order, so it is part of the wire contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterMap {
    entries: Vec<(String, FilterEntry)>,
}

impl FilterMap {
    /// Creates an empty filter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of active filters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no filters are active.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry for `column`, if any.
    pub fn get(&self, column: &str) -> Option<&FilterEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, e)| e)
    }

    /// Inserts or replaces the filter for `column`.
    ///
    /// A replaced column keeps its original position.
    pub fn insert(&mut self, column: impl Into<String>, entry: FilterEntry) {
        let column = column.into();
        match self.entries.iter_mut().find(|(k, _)| *k == column) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((column, entry)),
        }
    }

    /// Removes the filter for `column`, returning it if present.
    pub fn remove(&mut self, column: &str) -> Option<FilterEntry> {
        let idx = self.entries.iter().position(|(k, _)| k == column)?;
        Some(self.entries.remove(idx).1)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }
}
