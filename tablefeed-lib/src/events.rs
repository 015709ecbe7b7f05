//! Host-facing table events.

use serde_json::Value;

use crate::model::Row;

/// Events emitted by a [`RemoteTable`](crate::RemoteTable) to its host.
///
/// All methods have no-op defaults; implement only what the host cares
/// about. Subscribers are registered on the
/// [builder](crate::RemoteTableBuilder::events) and invoked in registration
/// order on the task that triggered the event.
///
/// # Example
///
/// ```
/// use tablefeed_lib::TableEvents;
///
/// struct Spinner;
///
/// impl TableEvents for Spinner {
///     fn loading_change(&self, loading: bool) {
///         if loading { /* show */ } else { /* hide */ }
///     }
/// }
/// ```
pub trait TableEvents: Send + Sync {
    /// Fired at the start (`true`) and end (`false`) of every fetch cycle.
    fn loading_change(&self, loading: bool) {
        let _ = loading;
    }

    /// Fired when the host reports a row click via
    /// [`click_row`](crate::RemoteTable::click_row).
    fn click_row(&self, row: &Row) {
        let _ = row;
    }

    /// Fired after a row has been deleted from the data source.
    fn deleted_row(&self, id: &Value) {
        let _ = id;
    }
}
