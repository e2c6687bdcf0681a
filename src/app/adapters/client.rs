//! Client interface for the target store
//!
//! The ingestion pipeline treats the database purely as an opaque capability:
//! fetch the destination table's schema, asynchronously invoke a named
//! insertion operation on a row's field values, and close the connection.
//! [`MemoryStore`] plus [`MemoryClient`] form the bundled reference backend
//! used by the binary and the test suite; a driver for a real store
//! implements the same trait.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

use crate::app::models::{ColumnType, FieldValue, SubmitOutcome, TableSchema};
use crate::{Error, Result};

/// Asynchronous insertion capability of the target store.
///
/// `submit` resolves to exactly one [`SubmitOutcome`] per call; a refused
/// insertion is outcome data, not an error. Errors are reserved for
/// conditions that make the whole run impossible (unknown table, closed
/// connection).
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Fetch the destination table's column declarations
    async fn table_schema(&self, table: &str) -> Result<TableSchema>;

    /// Invoke the named insertion operation on one row's field values
    async fn submit(&self, table: &str, procedure: &str, values: Vec<FieldValue>) -> SubmitOutcome;

    /// Release the connection; submissions after close are refused
    async fn close(&self) -> Result<()>;
}

/// In-memory single-table store.
///
/// Outlives client connections, the way a server does. Enforces column
/// count, column types, NOT NULL, and any declared uniqueness constraints,
/// so submission failures behave like a real store's. Rows accumulate
/// across runs against the same store, which is what makes repeated loads
/// non-idempotent.
#[derive(Debug)]
pub struct MemoryStore {
    schema: TableSchema,
    state: Mutex<StoreState>,
}

#[derive(Debug)]
struct StoreState {
    rows: Vec<Vec<FieldValue>>,
    /// Seen key encodings per unique column index
    unique_seen: HashMap<usize, HashSet<String>>,
}

impl MemoryStore {
    pub fn new(schema: TableSchema) -> Result<Self> {
        if schema.columns.is_empty() {
            return Err(Error::configuration(format!(
                "table '{}' has no columns",
                schema.table
            )));
        }

        let unique_seen = schema
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.unique)
            .map(|(i, _)| (i, HashSet::new()))
            .collect();

        Ok(Self {
            schema,
            state: Mutex::new(StoreState {
                rows: Vec::new(),
                unique_seen,
            }),
        })
    }

    /// Number of tuples currently visible in the table
    pub async fn row_count(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    /// Snapshot of the stored tuples, in acceptance order
    pub async fn rows(&self) -> Vec<Vec<FieldValue>> {
        self.state.lock().await.rows.clone()
    }

    fn check_row(&self, values: &[FieldValue]) -> std::result::Result<(), String> {
        if values.len() != self.schema.columns.len() {
            return Err(format!(
                "expected {} values, got {}",
                self.schema.columns.len(),
                values.len()
            ));
        }

        for (value, column) in values.iter().zip(&self.schema.columns) {
            let ok = match (value, column.column_type) {
                (FieldValue::Null, _) => {
                    if !column.nullable {
                        return Err(format!(
                            "constraint violation: NULL for NOT NULL column '{}'",
                            column.name
                        ));
                    }
                    true
                }
                (FieldValue::Integer(_), ColumnType::Integer) => true,
                // Stores widen integers into float columns
                (FieldValue::Integer(_), ColumnType::Float) => true,
                (FieldValue::Float(_), ColumnType::Float) => true,
                (FieldValue::Text(_), ColumnType::Text) => true,
                _ => false,
            };
            if !ok {
                return Err(format!(
                    "type error: {:?} not valid for {} column '{}'",
                    value, column.column_type, column.name
                ));
            }
        }

        Ok(())
    }

    async fn insert(&self, values: Vec<FieldValue>) -> SubmitOutcome {
        if let Err(reason) = self.check_row(&values) {
            return SubmitOutcome::Failed(reason);
        }

        let mut state = self.state.lock().await;

        // Uniqueness checks must happen under the same lock as the insert,
        // and no key is registered unless the whole row is accepted
        let unique_keys: Vec<(usize, String)> = self
            .schema
            .columns
            .iter()
            .enumerate()
            .filter(|(i, c)| c.unique && !matches!(values[*i], FieldValue::Null))
            .map(|(i, _)| (i, values[i].to_string()))
            .collect();
        for (index, key) in &unique_keys {
            if state.unique_seen.entry(*index).or_default().contains(key) {
                return SubmitOutcome::Failed(format!(
                    "constraint violation: duplicate value '{}' for unique column '{}'",
                    key, self.schema.columns[*index].name
                ));
            }
        }
        for (index, key) in unique_keys {
            state.unique_seen.entry(index).or_default().insert(key);
        }

        state.rows.push(values);
        SubmitOutcome::Accepted
    }
}

/// One client connection to a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryClient {
    store: Arc<MemoryStore>,
    closed: AtomicBool,
}

impl MemoryClient {
    /// Establish a connection to the store
    pub fn connect(store: Arc<MemoryStore>) -> Self {
        debug!(
            "Connected to in-memory store for table '{}'",
            store.schema.table
        );
        Self {
            store,
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl TableClient for MemoryClient {
    async fn table_schema(&self, table: &str) -> Result<TableSchema> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::connection("client connection is closed"));
        }
        if !table.eq_ignore_ascii_case(&self.store.schema.table) {
            return Err(Error::unknown_table(table));
        }
        Ok(self.store.schema.clone())
    }

    async fn submit(&self, table: &str, _procedure: &str, values: Vec<FieldValue>) -> SubmitOutcome {
        if self.closed.load(Ordering::SeqCst) {
            return SubmitOutcome::Failed("client connection is closed".to_string());
        }
        if !table.eq_ignore_ascii_case(&self.store.schema.table) {
            return SubmitOutcome::Failed(format!("table '{}' does not exist", table));
        }
        self.store.insert(values).await
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        debug!(
            "Closed connection to in-memory store for table '{}'",
            self.store.schema.table
        );
        Ok(())
    }
}
