//! Query string assembly.
//!
//! The backend speaks a compact query grammar:
//!
//! ```text
//! ?select=id,name,price&limit=20,10&where=active,=,true[and]qty,>,5
//! ```
//!
//! Filter fragments are `column,operand,value` joined by a literal `[and]`
//! suffix on every fragment except the last. `limit` carries the window's
//! exclusive upper bound first and the offset second; the backend expects
//! that order, conventional or not. The `where=` key is omitted entirely
//! when no filter is active.

use super::FilterMap;
use super::PageState;

/// Builds the dynamic filter clause from the active filters.
///
/// Fragments are emitted in the map's insertion order, `[and]`-joined with no
/// trailing suffix. An empty map yields an empty string.
pub fn filter_clause(filters: &FilterMap) -> String {
    let last = filters.len().saturating_sub(1);
    let mut clause = String::new();

    for (i, (column, entry)) in filters.iter().enumerate() {
        clause.push_str(&format!("{},{},{}", column, entry.operand(), entry.value()));
        if i < last {
            clause.push_str("[and]");
        }
    }

    clause
}

/// Composes the full where-expression from the static filter and the dynamic
/// filter clause.
///
/// When both are present the static filter comes first, `[and]`-joined; when
/// only one is non-empty it stands alone; when both are empty the result is
/// empty and the `where=` key is dropped from the query.
pub fn where_expression(static_filter: Option<&str>, filters: &FilterMap) -> String {
    let dynamic = filter_clause(filters);

    match static_filter.filter(|s| !s.is_empty()) {
        Some(fixed) if !dynamic.is_empty() => format!("{}[and]{}", fixed, dynamic),
        Some(fixed) => fixed.to_string(),
        None => dynamic,
    }
}

/// Builds the row-page query string.
///
/// `id` is always requested ahead of the configured select columns; deletion
/// and row identity depend on it.
pub fn row_query(select_columns: &[String], page: &PageState, where_expr: &str) -> String {
    let mut query = format!(
        "?select=id,{}&limit={},{}",
        select_columns.join(","),
        page.limit(),
        page.offset()
    );

    if !where_expr.is_empty() {
        query.push_str(&format!("&where={}", where_expr));
    }

    query
}
