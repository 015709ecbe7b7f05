//! Remote table controller library
//!
//! A headless async controller for server-paged, server-filtered tables:
//! pagination and per-column filter state, query string assembly, and
//! count/list/delete orchestration against an abstract data source, with
//! loading/row/deletion events for the hosting UI.

pub mod error;
pub mod events;
pub mod model;
pub mod query;
pub mod source;

mod config;
mod controller;
mod debounce;

pub use config::RowTransform;
pub use config::TableConfig;
pub use controller::DeleteOutcome;
pub use controller::RemoteTable;
pub use controller::RemoteTableBuilder;
pub use controller::TableSnapshot;
pub use error::SourceError;
pub use error::TableError;
pub use events::TableEvents;
