//! Remote table controller.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use futures::future;
use log::debug;
use log::warn;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::TableConfig;
use crate::debounce::Debouncer;
use crate::error::TableError;
use crate::events::TableEvents;
use crate::model::Row;
use crate::model::RowSet;
use crate::query::FilterEntry;
use crate::query::FilterMap;
use crate::query::FilterValue;
use crate::query::PageState;
use crate::query::is_presence_operand;
use crate::query::row_query;
use crate::query::where_expression;
use crate::source::ConfirmPrompt;
use crate::source::DataSource;

/// Outcome of a [`RemoteTable::delete_row`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The row was deleted and the table refetched.
    Deleted,
    /// The confirmation prompt was declined; nothing happened.
    Declined,
}

/// A consistent copy of the table's committed state.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    /// The current page of rows.
    pub rows: Vec<Row>,
    /// Ordered column names to render.
    pub headers: Vec<String>,
    /// Total rows matching the current filters, across all pages.
    pub total_rows: u64,
    /// 1-based current page.
    pub current_page: usize,
    /// Rows per page.
    pub page_size: usize,
}

impl TableSnapshot {
    /// Returns `true` when the current page holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Controller for a server-paged, server-filtered table.
///
/// Owns pagination state and a per-column filter map, derives the query
/// string for an abstract [`DataSource`], and reconciles fetched rows into a
/// renderable [`TableSnapshot`], emitting [`TableEvents`] along the way.
///
/// The handle is cheap to clone and safe to share; all state lives behind a
/// shared inner.
///
/// # Lifecycle
///
/// Build, then call [`initialize`](Self::initialize) once to run the first
/// fetch cycle. Before `initialize`, snapshots report the empty initial state
/// (no rows, headers equal to the configured select columns, zero total).
/// Call [`dispose`](Self::dispose) when the host detaches the table; pending
/// debounce timers are cancelled and no further fetch cycles start.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tablefeed_lib::RemoteTable;
/// use tablefeed_lib::TableConfig;
/// use tablefeed_lib::source::HttpSource;
///
/// # async fn run() -> Result<(), tablefeed_lib::TableError> {
/// let source = Arc::new(HttpSource::new("https://api.example.com/v1")?);
/// let table = RemoteTable::builder(
///     TableConfig::new("items", &["name", "price"]).deletable(true),
///     source,
/// )
/// .build()?;
///
/// table.initialize().await?;
/// for row in table.snapshot().await.rows {
///     println!("{:?}", row);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RemoteTable {
    inner: Arc<TableInner>,
}

impl std::fmt::Debug for RemoteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTable")
            .field("endpoint", &self.inner.config.endpoint)
            .finish_non_exhaustive()
    }
}

struct TableInner {
    config: TableConfig,
    source: Arc<dyn DataSource>,
    confirm: Arc<dyn ConfirmPrompt>,
    subscribers: Vec<Arc<dyn TableEvents>>,
    filters: Mutex<FilterMap>,
    page: Mutex<PageState>,
    committed: Mutex<Committed>,
    cycle_seq: AtomicU64,
    disposed: AtomicBool,
    debounce: Debouncer,
}

struct Committed {
    row_set: RowSet,
    total_rows: u64,
    /// Token of the cycle that produced this state. Later cycles commit over
    /// earlier ones; earlier cycles arriving late are discarded.
    cycle: u64,
}

impl RemoteTable {
    /// Creates a builder for the given configuration and data source.
    pub fn builder(config: TableConfig, source: Arc<dyn DataSource>) -> RemoteTableBuilder {
        RemoteTableBuilder {
            config,
            source,
            confirm: Arc::new(crate::source::AutoConfirm),
            subscribers: Vec::new(),
        }
    }

    /// Builds a table with default collaborators, no subscribers.
    pub fn new(config: TableConfig, source: Arc<dyn DataSource>) -> Result<Self, TableError> {
        Self::builder(config, source).build()
    }

    /// Runs the first fetch cycle.
    pub async fn initialize(&self) -> Result<(), TableError> {
        self.inner.refetch().await
    }

    /// Cancels any pending debounced refetch and stops future fetch cycles.
    pub async fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::Release);
        self.inner.debounce.cancel().await;
    }

    /// Updates or clears the filter for `column`, then refetches after the
    /// debounce window of silence.
    ///
    /// The filter map changes before this call returns; only the refetch is
    /// deferred, and a burst of calls collapses into a single cycle that uses
    /// the map state as of the last call. An empty or `"null"` raw value
    /// clears the column's filter unless the operand is a presence test
    /// (`is` / `is not null` family). Values that parse as finite numbers are
    /// carried numerically.
    pub async fn set_column_filter(&self, column: &str, operand: &str, raw_value: &str) {
        {
            let mut filters = self.inner.filters.lock().await;
            if !is_presence_operand(operand) && (raw_value.is_empty() || raw_value == "null") {
                filters.remove(column);
            } else {
                let entry = FilterEntry::new(operand, FilterValue::parse(raw_value));
                filters.insert(column, entry);
            }
        }

        let inner = Arc::clone(&self.inner);
        self.inner
            .debounce
            .schedule(async move {
                // Debounced cycles have no awaiting caller to hand the error
                // to; loading_change(false) has already fired.
                if let Err(e) = inner.refetch().await {
                    warn!("debounced refetch failed: {}", e);
                }
            })
            .await;
    }

    /// Moves to the given 0-based page with the given page size and refetches
    /// immediately (no debounce).
    pub async fn set_page(&self, page_index: usize, page_size: usize) -> Result<(), TableError> {
        {
            let mut page = self.inner.page.lock().await;
            page.set_page(page_index, page_size);
        }
        self.inner.refetch().await
    }

    /// Refetches immediately without touching filters or paging.
    ///
    /// For "data changed elsewhere" signals from the host.
    pub async fn reload_now(&self) -> Result<(), TableError> {
        self.inner.refetch().await
    }

    /// Deletes `row` from the data source after confirmation.
    ///
    /// Fails with [`TableError::PermissionDenied`] unless the table was
    /// configured deletable. A declined confirmation is a no-op reported as
    /// [`DeleteOutcome::Declined`]. On success the `deleted_row` event fires
    /// and the table refetches; on failure committed state is untouched.
    pub async fn delete_row(&self, row: &Row) -> Result<DeleteOutcome, TableError> {
        if !self.inner.config.deletable {
            return Err(TableError::PermissionDenied);
        }
        let id = row.id().cloned().ok_or(TableError::MissingId)?;

        if !self.inner.confirm.confirm(&self.inner.config.delete_prompt) {
            return Ok(DeleteOutcome::Declined);
        }

        let response = self
            .inner
            .source
            .delete(&self.inner.config.endpoint, &id)
            .await?;
        if !response.success {
            return Err(TableError::DeleteRejected {
                message: response.message,
            });
        }

        self.inner.emit_deleted(&id);
        self.inner.refetch().await?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Reports a row click to subscribers. No state change.
    pub fn click_row(&self, row: &Row) {
        for subscriber in &self.inner.subscribers {
            subscriber.click_row(row);
        }
    }

    /// Returns a consistent copy of the committed state plus paging.
    pub async fn snapshot(&self) -> TableSnapshot {
        let committed = self.inner.committed.lock().await;
        let page = self.inner.page.lock().await;
        TableSnapshot {
            rows: committed.row_set.rows.clone(),
            headers: committed.row_set.headers.clone(),
            total_rows: committed.total_rows,
            current_page: page.current_page(),
            page_size: page.page_size(),
        }
    }

    /// Returns the where-expression the next fetch cycle would use.
    pub async fn where_expression(&self) -> String {
        let filters = self.inner.filters.lock().await;
        where_expression(self.inner.config.static_filter.as_deref(), &filters)
    }

    /// Returns the table configuration.
    pub fn config(&self) -> &TableConfig {
        &self.inner.config
    }
}

impl TableInner {
    /// Runs one fetch cycle: loading on, count + list, commit if still the
    /// newest cycle, loading off.
    async fn refetch(&self) -> Result<(), TableError> {
        if self.disposed.load(Ordering::Acquire) {
            debug!("table disposed, skipping fetch cycle");
            return Ok(());
        }

        let cycle = self.cycle_seq.fetch_add(1, Ordering::AcqRel) + 1;
        self.emit_loading(true);
        let result = self.run_cycle(cycle).await;
        // Fires even when the cycle failed or was superseded.
        self.emit_loading(false);
        result
    }

    async fn run_cycle(&self, cycle: u64) -> Result<(), TableError> {
        let where_expr = {
            let filters = self.filters.lock().await;
            where_expression(self.config.static_filter.as_deref(), &filters)
        };
        let query = {
            let page = self.page.lock().await;
            row_query(&self.config.select_columns, &page, &where_expr)
        };
        debug!("cycle {}: {}{}", cycle, self.config.endpoint, query);

        let endpoint = self.config.endpoint.as_str();
        let (total_rows, raw_rows) = future::try_join(
            self.source.count(endpoint, &where_expr),
            self.source.list(endpoint, &query),
        )
        .await?;

        let row_set = self.build_row_set(raw_rows);

        let mut committed = self.committed.lock().await;
        if cycle <= committed.cycle {
            debug!(
                "cycle {}: superseded by cycle {}, discarding",
                cycle, committed.cycle
            );
            return Ok(());
        }
        committed.row_set = row_set;
        committed.total_rows = total_rows;
        committed.cycle = cycle;
        Ok(())
    }

    /// Applies the row transform (when configured) and derives headers.
    ///
    /// Headers come from the first transformed row's own columns, falling
    /// back to the configured select columns for an empty result set. The raw
    /// row's `id` is re-attached after header derivation, so a transform need
    /// not carry it through.
    fn build_row_set(&self, raw_rows: Vec<Row>) -> RowSet {
        let Some(transform) = &self.config.row_transform else {
            return RowSet {
                headers: self.config.select_columns.clone(),
                rows: raw_rows,
            };
        };

        let mut headers = self.config.select_columns.clone();
        let mut rows = Vec::with_capacity(raw_rows.len());
        for (i, original) in raw_rows.iter().enumerate() {
            let mut row = transform(original);
            if i == 0 {
                headers = row.columns().map(str::to_string).collect();
            }
            if let Some(id) = original.id() {
                row.insert("id", id.clone());
            }
            rows.push(row);
        }

        RowSet { rows, headers }
    }

    fn emit_loading(&self, loading: bool) {
        for subscriber in &self.subscribers {
            subscriber.loading_change(loading);
        }
    }

    fn emit_deleted(&self, id: &Value) {
        for subscriber in &self.subscribers {
            subscriber.deleted_row(id);
        }
    }
}

/// Builder for [`RemoteTable`].
pub struct RemoteTableBuilder {
    config: TableConfig,
    source: Arc<dyn DataSource>,
    confirm: Arc<dyn ConfirmPrompt>,
    subscribers: Vec<Arc<dyn TableEvents>>,
}

impl RemoteTableBuilder {
    /// Sets the confirmation collaborator consulted before deletes.
    ///
    /// Defaults to [`AutoConfirm`](crate::source::AutoConfirm).
    pub fn confirm(mut self, prompt: Arc<dyn ConfirmPrompt>) -> Self {
        self.confirm = prompt;
        self
    }

    /// Registers an event subscriber. May be called multiple times;
    /// subscribers are notified in registration order.
    pub fn events(mut self, subscriber: Arc<dyn TableEvents>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Validates the configuration and builds the table.
    pub fn build(self) -> Result<RemoteTable, TableError> {
        self.config.validate().map_err(TableError::InvalidConfig)?;

        let initial_headers = self.config.select_columns.clone();
        let page_size = self.config.page_size;
        let debounce = self.config.debounce;

        Ok(RemoteTable {
            inner: Arc::new(TableInner {
                source: self.source,
                confirm: self.confirm,
                subscribers: self.subscribers,
                filters: Mutex::new(FilterMap::new()),
                page: Mutex::new(PageState::new(page_size)),
                committed: Mutex::new(Committed {
                    row_set: RowSet::empty(initial_headers),
                    total_rows: 0,
                    cycle: 0,
                }),
                cycle_seq: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
                debounce: Debouncer::new(debounce),
                config: self.config,
            }),
        })
    }
}
