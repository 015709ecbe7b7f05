//! Controller integration tests against a scripted in-memory data source.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use serde_json::json;
use tablefeed_lib::DeleteOutcome;
use tablefeed_lib::RemoteTable;
use tablefeed_lib::TableConfig;
use tablefeed_lib::TableError;
use tablefeed_lib::TableEvents;
use tablefeed_lib::error::SourceError;
use tablefeed_lib::model::Row;
use tablefeed_lib::source::ConfirmPrompt;
use tablefeed_lib::source::DataSource;
use tablefeed_lib::source::DeleteResponse;

fn row(id: i64, name: &str, price: i64) -> Row {
    Row::new()
        .set("id", json!(id))
        .set("name", json!(name))
        .set("price", json!(price))
}

/// In-memory data source with scriptable per-call rows and delays.
#[derive(Default)]
struct ScriptedSource {
    rows: Mutex<Vec<Row>>,
    total: AtomicU64,
    /// Per-list-call overrides, popped front to back.
    row_script: Mutex<VecDeque<Vec<Row>>>,
    /// Per-list-call artificial latency, popped front to back.
    delay_script: Mutex<VecDeque<Duration>>,
    fail_count: AtomicBool,
    delete_response: Mutex<Option<DeleteResponse>>,
    queries: Mutex<Vec<String>>,
    wheres: Mutex<Vec<String>>,
    deleted_ids: Mutex<Vec<Value>>,
    list_calls: AtomicUsize,
}

impl ScriptedSource {
    fn with_rows(rows: Vec<Row>, total: u64) -> Arc<Self> {
        let source = Self::default();
        *source.rows.lock().unwrap() = rows;
        source.total.store(total, Ordering::SeqCst);
        Arc::new(source)
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn wheres(&self) -> Vec<String> {
        self.wheres.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn count(&self, _endpoint: &str, where_expression: &str) -> Result<u64, SourceError> {
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(SourceError::network("count unreachable"));
        }
        self.wheres
            .lock()
            .unwrap()
            .push(where_expression.to_string());
        Ok(self.total.load(Ordering::SeqCst))
    }

    async fn list(&self, _endpoint: &str, query: &str) -> Result<Vec<Row>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        let delay = self.delay_script.lock().unwrap().pop_front();
        let scripted = self.row_script.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(scripted.unwrap_or_else(|| self.rows.lock().unwrap().clone()))
    }

    async fn delete(&self, _endpoint: &str, id: &Value) -> Result<DeleteResponse, SourceError> {
        self.deleted_ids.lock().unwrap().push(id.clone());
        Ok(self
            .delete_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or(DeleteResponse {
                success: true,
                message: None,
            }))
    }
}

#[derive(Default)]
struct EventLog {
    loading: Mutex<Vec<bool>>,
    clicked: Mutex<Vec<Row>>,
    deleted: Mutex<Vec<Value>>,
}

impl TableEvents for EventLog {
    fn loading_change(&self, loading: bool) {
        self.loading.lock().unwrap().push(loading);
    }

    fn click_row(&self, row: &Row) {
        self.clicked.lock().unwrap().push(row.clone());
    }

    fn deleted_row(&self, id: &Value) {
        self.deleted.lock().unwrap().push(id.clone());
    }
}

struct DenyAll;

impl ConfirmPrompt for DenyAll {
    fn confirm(&self, _message: &str) -> bool {
        false
    }
}

struct RecordingConfirm {
    messages: Mutex<Vec<String>>,
}

impl ConfirmPrompt for RecordingConfirm {
    fn confirm(&self, message: &str) -> bool {
        self.messages.lock().unwrap().push(message.to_string());
        true
    }
}

fn items_config() -> TableConfig {
    TableConfig::new("items", &["name", "price"])
}

/// Lets spawned fetch tasks run to completion (no timers involved).
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_initialize_commits_rows_headers_and_total() {
    let source = ScriptedSource::with_rows(vec![row(1, "apple", 5), row(2, "pear", 7)], 42);
    let table = RemoteTable::new(items_config(), source.clone()).unwrap();

    table.initialize().await.unwrap();

    let snapshot = table.snapshot().await;
    assert_eq!(snapshot.rows.len(), 2);
    assert_eq!(snapshot.headers, vec!["name", "price"]);
    assert_eq!(snapshot.total_rows, 42);
    assert_eq!(snapshot.current_page, 1);
    assert_eq!(source.queries(), vec!["?select=id,name,price&limit=10,0"]);
    assert_eq!(source.wheres(), vec![""]);
}

#[tokio::test]
async fn test_snapshot_before_initialize_is_empty() {
    let source = ScriptedSource::with_rows(vec![row(1, "apple", 5)], 1);
    let table = RemoteTable::new(items_config(), source).unwrap();

    let snapshot = table.snapshot().await;
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.headers, vec!["name", "price"]);
    assert_eq!(snapshot.total_rows, 0);
}

#[tokio::test]
async fn test_set_page_is_zero_based_and_immediate() {
    let source = ScriptedSource::with_rows(vec![row(1, "apple", 5)], 42);
    let table = RemoteTable::new(items_config(), source.clone()).unwrap();

    table.set_page(1, 10).await.unwrap();

    assert_eq!(source.queries(), vec!["?select=id,name,price&limit=20,10"]);
    assert_eq!(table.snapshot().await.current_page, 2);
}

#[tokio::test]
async fn test_static_and_dynamic_filters_compose() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let config = items_config().static_filter("active,=,true");
    let table = RemoteTable::new(config, source.clone()).unwrap();

    table.set_column_filter("qty", ">", "5").await;

    assert_eq!(table.where_expression().await, "active,=,true[and]qty,>,5");
}

#[tokio::test]
async fn test_filter_values_parse_numerically() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let table = RemoteTable::new(items_config(), source).unwrap();

    table.set_column_filter("age", "=", "30").await;
    table.set_column_filter("name", "=", "Bob").await;

    assert_eq!(table.where_expression().await, "age,=,30[and]name,=,Bob");
}

#[tokio::test]
async fn test_empty_value_clears_filter_except_presence_operands() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let table = RemoteTable::new(items_config(), source).unwrap();

    table.set_column_filter("age", "=", "30").await;
    table.set_column_filter("age", "=", "").await;
    assert_eq!(table.where_expression().await, "");

    table.set_column_filter("age", "is", "").await;
    assert_eq!(table.where_expression().await, "age,is,");

    table.set_column_filter("age", "=", "null").await;
    assert_eq!(table.where_expression().await, "");
}

#[tokio::test(start_paused = true)]
async fn test_filter_burst_triggers_exactly_one_refetch() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let table = RemoteTable::new(items_config(), source.clone()).unwrap();

    table.set_column_filter("qty", ">", "1").await;
    tokio::time::advance(Duration::from_millis(100)).await;
    table.set_column_filter("name", "=", "Bob").await;
    tokio::time::advance(Duration::from_millis(100)).await;
    table.set_column_filter("qty", ">", "5").await;
    tokio::task::yield_now().await;

    // Inside the window nothing has fired yet.
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 0);

    tokio::time::advance(Duration::from_millis(500)).await;
    settle().await;

    assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
    // The one refetch used the map state as of the last call.
    assert_eq!(source.wheres(), vec!["qty,>,5[and]name,=,Bob"]);
}

#[tokio::test(start_paused = true)]
async fn test_last_initiated_cycle_wins() {
    let source = ScriptedSource::with_rows(vec![], 1);
    source
        .row_script
        .lock()
        .unwrap()
        .extend([vec![row(1, "stale", 1)], vec![row(2, "fresh", 2)]]);
    source
        .delay_script
        .lock()
        .unwrap()
        .extend([Duration::from_millis(300), Duration::from_millis(10)]);

    let table = RemoteTable::new(items_config(), source.clone()).unwrap();

    // Cycle A starts first and answers last.
    let slow = {
        let table = table.clone();
        tokio::spawn(async move { table.reload_now().await })
    };
    tokio::task::yield_now().await;

    // Cycle B starts second, answers first, and must win.
    table.reload_now().await.unwrap();
    slow.await.unwrap().unwrap();

    let snapshot = table.snapshot().await;
    assert_eq!(snapshot.rows, vec![row(2, "fresh", 2)]);
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reload_is_idempotent() {
    let source = ScriptedSource::with_rows(vec![row(1, "apple", 5)], 1);
    let table = RemoteTable::new(items_config(), source.clone()).unwrap();

    table.reload_now().await.unwrap();
    let first = table.snapshot().await;
    table.reload_now().await.unwrap();
    let second = table.snapshot().await;

    assert_eq!(first, second);
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_cycle_leaves_state_intact() {
    let source = ScriptedSource::with_rows(vec![row(1, "apple", 5)], 1);
    let events = Arc::new(EventLog::default());
    let table = RemoteTable::builder(items_config(), source.clone())
        .events(events.clone())
        .build()
        .unwrap();

    table.initialize().await.unwrap();
    let before = table.snapshot().await;

    source.fail_count.store(true, Ordering::SeqCst);
    let err = table.reload_now().await.unwrap_err();
    assert!(matches!(err, TableError::Source(_)));

    assert_eq!(table.snapshot().await, before);
    // loading_change fired for both cycles, including the failed one.
    assert_eq!(*events.loading.lock().unwrap(), vec![true, false, true, false]);
}

#[tokio::test]
async fn test_delete_requires_permission() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let table = RemoteTable::new(items_config(), source.clone()).unwrap();

    let err = table.delete_row(&row(1, "apple", 5)).await.unwrap_err();
    assert!(matches!(err, TableError::PermissionDenied));
    assert!(source.deleted_ids.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_declined_is_a_noop() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let table = RemoteTable::builder(items_config().deletable(true), source.clone())
        .confirm(Arc::new(DenyAll))
        .build()
        .unwrap();

    let outcome = table.delete_row(&row(1, "apple", 5)).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Declined);
    assert!(source.deleted_ids.lock().unwrap().is_empty());
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_delete_success_emits_event_and_refetches() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let events = Arc::new(EventLog::default());
    let confirm = Arc::new(RecordingConfirm {
        messages: Mutex::new(Vec::new()),
    });
    let config = items_config().deletable(true).delete_prompt("Delete apple?");
    let table = RemoteTable::builder(config, source.clone())
        .confirm(confirm.clone())
        .events(events.clone())
        .build()
        .unwrap();

    let outcome = table.delete_row(&row(7, "apple", 5)).await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(*confirm.messages.lock().unwrap(), vec!["Delete apple?"]);
    assert_eq!(*source.deleted_ids.lock().unwrap(), vec![json!(7)]);
    assert_eq!(*events.deleted.lock().unwrap(), vec![json!(7)]);
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delete_rejection_is_surfaced() {
    let source = ScriptedSource::with_rows(vec![], 0);
    *source.delete_response.lock().unwrap() = Some(DeleteResponse {
        success: false,
        message: Some("row is referenced".to_string()),
    });
    let table = RemoteTable::new(items_config().deletable(true), source.clone()).unwrap();

    let err = table.delete_row(&row(7, "apple", 5)).await.unwrap_err();
    assert!(matches!(err, TableError::DeleteRejected { .. }));
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_delete_without_id_fails() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let table = RemoteTable::new(items_config().deletable(true), source.clone()).unwrap();

    let anonymous = Row::new().set("name", json!("apple"));
    let err = table.delete_row(&anonymous).await.unwrap_err();
    assert!(matches!(err, TableError::MissingId));
    assert!(source.deleted_ids.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_click_row_emits_without_state_change() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let events = Arc::new(EventLog::default());
    let table = RemoteTable::builder(items_config(), source.clone())
        .events(events.clone())
        .build()
        .unwrap();

    let clicked = row(3, "pear", 7);
    table.click_row(&clicked);

    assert_eq!(*events.clicked.lock().unwrap(), vec![clicked]);
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_row_transform_redefines_headers_and_keeps_id() {
    let raw = Row::new()
        .set("id", json!(1))
        .set("name", json!("Bob"))
        .set("dob", json!("1987-11-20"));
    let source = ScriptedSource::with_rows(vec![raw], 1);

    let config = TableConfig::new("people", &["name", "dob"]).row_transform(|original| {
        Row::new()
            .set("name", original.get("name").cloned().unwrap_or(Value::Null))
            .set("age", json!(33))
    });
    let table = RemoteTable::new(config, source).unwrap();
    table.initialize().await.unwrap();

    let snapshot = table.snapshot().await;
    assert_eq!(snapshot.headers, vec!["name", "age"]);
    assert_eq!(snapshot.rows[0].get("age"), Some(&json!(33)));
    // The raw row's id survives the transform.
    assert_eq!(snapshot.rows[0].id(), Some(&json!(1)));
}

#[tokio::test]
async fn test_row_transform_with_empty_page_keeps_select_headers() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let config = TableConfig::new("people", &["name", "dob"])
        .row_transform(|original| original.clone());
    let table = RemoteTable::new(config, source).unwrap();

    table.initialize().await.unwrap();
    assert_eq!(table.snapshot().await.headers, vec!["name", "dob"]);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_cancels_pending_refetch() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let table = RemoteTable::new(items_config(), source.clone()).unwrap();

    table.set_column_filter("qty", ">", "5").await;
    table.dispose().await;

    tokio::time::advance(Duration::from_millis(600)).await;
    settle().await;
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 0);

    // Explicit reloads after dispose are inert too.
    table.reload_now().await.unwrap();
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let source = ScriptedSource::with_rows(vec![], 0);
    let err = RemoteTable::new(TableConfig::new("items", &[]), source).unwrap_err();
    assert!(matches!(err, TableError::InvalidConfig(_)));
}
