use crate::config::TrackingTable;
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::store::{AppliedIds, MigrationRecord, RecordStoreProvider};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory implementation of a record store.
///
/// # Purpose
/// `InMemoryStore` models a small database entirely in process: a set of
/// tracking tables keeping their records in insertion order, and a log of
/// every schema statement executed through it. It is meant for tests and
/// for embedders whose "schema" lives in memory.
///
/// # Characteristics
/// - **Transactional**: `begin` snapshots the whole state, `rollback` restores it
/// - **Single transaction**: a nested `begin` is rejected
/// - **Length-checked**: identifiers longer than the configured column size are rejected
/// - **Shared**: clones observe and mutate the same state
///
/// # Usage
/// ```text
/// let memory = InMemoryStore::new();
/// let store = RecordStore::new(memory.clone());
/// // ... run migrations ...
/// assert_eq!(memory.records("migrations").len(), 3);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore {
            inner: Arc::new(InMemoryStoreInner::new()),
        }
    }

    /// Returns the records of a table in insertion order.
    ///
    /// An unknown table yields an empty list.
    pub fn records(&self, table_name: &str) -> Vec<MigrationRecord> {
        self.inner.records(table_name)
    }

    /// Returns every schema statement executed so far, oldest first.
    pub fn statements(&self) -> Vec<String> {
        self.inner.state.read().statements.clone()
    }

    pub fn has_table(&self, table_name: &str) -> bool {
        self.inner.state.read().tables.contains_key(table_name)
    }

    pub fn in_transaction(&self) -> bool {
        self.inner.snapshot.lock().is_some()
    }
}

impl RecordStoreProvider for InMemoryStore {
    fn ensure_tracking_storage(&self, table: &TrackingTable) -> StrataResult<()> {
        self.inner.ensure_table(table)
    }

    fn is_applied(&self, table: &TrackingTable, id: &str) -> StrataResult<bool> {
        self.inner.with_table(table, |records| records.contains_key(id))
    }

    fn count_applied(&self, table: &TrackingTable) -> StrataResult<u64> {
        self.inner.with_table(table, |records| records.len() as u64)
    }

    fn applied_ids(&self, table: &TrackingTable) -> StrataResult<AppliedIds<'_>> {
        let ids = self
            .inner
            .with_table(table, |records| records.keys().cloned().collect::<Vec<_>>())?;
        Ok(Box::new(ids.into_iter().map(Ok)))
    }

    fn record_applied(&self, table: &TrackingTable, record: &MigrationRecord) -> StrataResult<()> {
        self.inner.insert(table, record)
    }

    fn record_reverted(&self, table: &TrackingTable, id: &str) -> StrataResult<()> {
        self.inner.remove(table, id)
    }

    fn execute(&self, statement: &str) -> StrataResult<()> {
        self.inner.state.write().statements.push(statement.to_string());
        Ok(())
    }

    fn begin(&self) -> StrataResult<()> {
        self.inner.begin()
    }

    fn commit(&self) -> StrataResult<()> {
        self.inner.commit()
    }

    fn rollback(&self) -> StrataResult<()> {
        self.inner.rollback()
    }
}

#[derive(Clone, Default)]
struct MemoryState {
    tables: HashMap<String, IndexMap<String, MigrationRecord>>,
    statements: Vec<String>,
}

#[derive(Default)]
struct InMemoryStoreInner {
    state: RwLock<MemoryState>,
    snapshot: Mutex<Option<MemoryState>>,
}

impl InMemoryStoreInner {
    fn new() -> InMemoryStoreInner {
        InMemoryStoreInner {
            state: RwLock::new(MemoryState::default()),
            snapshot: Mutex::new(None),
        }
    }

    fn records(&self, table_name: &str) -> Vec<MigrationRecord> {
        self.state
            .read()
            .tables
            .get(table_name)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    fn ensure_table(&self, table: &TrackingTable) -> StrataResult<()> {
        let mut state = self.state.write();
        if !state.tables.contains_key(&table.name) {
            log::debug!("Creating tracking table '{}'", table.name);
            state.tables.insert(table.name.clone(), IndexMap::new());
        }
        Ok(())
    }

    fn with_table<R>(
        &self,
        table: &TrackingTable,
        f: impl FnOnce(&IndexMap<String, MigrationRecord>) -> R,
    ) -> StrataResult<R> {
        let state = self.state.read();
        match state.tables.get(&table.name) {
            Some(records) => Ok(f(records)),
            None => Err(no_such_table(table)),
        }
    }

    fn insert(&self, table: &TrackingTable, record: &MigrationRecord) -> StrataResult<()> {
        table.check_id_length(record.id())?;

        let mut state = self.state.write();
        let records = state
            .tables
            .get_mut(&table.name)
            .ok_or_else(|| no_such_table(table))?;

        if records.contains_key(record.id()) {
            log::error!(
                "Record '{}' already exists in table '{}'",
                record.id(),
                table.name
            );
            return Err(StrataError::new(
                &format!(
                    "Unique constraint violated: '{}' already exists in table '{}'",
                    record.id(),
                    table.name
                ),
                ErrorKind::StoreError,
            ));
        }
        records.insert(record.id().to_string(), record.clone());
        Ok(())
    }

    fn remove(&self, table: &TrackingTable, id: &str) -> StrataResult<()> {
        let mut state = self.state.write();
        let records = state
            .tables
            .get_mut(&table.name)
            .ok_or_else(|| no_such_table(table))?;
        // keep the remaining records in insertion order
        records.shift_remove(id);
        Ok(())
    }

    fn begin(&self) -> StrataResult<()> {
        let mut snapshot = self.snapshot.lock();
        if snapshot.is_some() {
            log::error!("A transaction is already active");
            return Err(StrataError::new(
                "A transaction is already active",
                ErrorKind::TransactionError,
            ));
        }
        *snapshot = Some(self.state.read().clone());
        Ok(())
    }

    fn commit(&self) -> StrataResult<()> {
        match self.snapshot.lock().take() {
            Some(_) => Ok(()),
            None => Err(no_active_transaction()),
        }
    }

    fn rollback(&self) -> StrataResult<()> {
        match self.snapshot.lock().take() {
            Some(previous) => {
                *self.state.write() = previous;
                Ok(())
            }
            None => Err(no_active_transaction()),
        }
    }
}

fn no_such_table(table: &TrackingTable) -> StrataError {
    StrataError::new(
        &format!("No such table: {}", table.name),
        ErrorKind::StoreError,
    )
}

fn no_active_transaction() -> StrataError {
    StrataError::new("No active transaction", ErrorKind::TransactionError)
}
