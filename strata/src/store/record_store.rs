use crate::config::TrackingTable;
use crate::errors::StrataResult;
use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

/// Iterator over the identifiers currently held by a tracking table.
///
/// Providers may stream rows lazily or hand back a materialized list;
/// the engine only ever walks it once.
pub type AppliedIds<'a> = Box<dyn Iterator<Item = StrataResult<String>> + 'a>;

/// The persisted trace of an applied migration.
///
/// A record is created when a migration (or the schema-init shortcut)
/// succeeds and deleted when that migration is rolled back. It is never
/// updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MigrationRecord {
    id: String,
    description: Option<String>,
}

impl MigrationRecord {
    pub fn new(id: &str, description: Option<&str>) -> Self {
        MigrationRecord {
            id: id.to_string(),
            description: description.map(|d| d.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Low-level contract every record store must fulfil.
///
/// # Purpose
/// Defines the database collaborator the engine consumes: tracking table
/// maintenance, record queries and writes, raw schema statement execution
/// and the transaction primitives.
///
/// # Key Responsibilities
/// - **Tracking Table**: create it on demand, scoped to the given [`TrackingTable`]
/// - **Records**: answer "is X applied", count, list, insert and delete
/// - **Schema Statements**: run statements issued by migration actions
/// - **Transactions**: begin, commit and roll back one transaction at a time
///
/// # Implementations
/// - `InMemoryStore`: snapshot based, for tests and in-process schemas
/// - `SqliteStore`: SQLite backend from the `strata-sqlite-adapter` crate
///
/// # Thread Safety
/// Implementers must be `Send + Sync`. The engine itself never issues two
/// calls concurrently.
pub trait RecordStoreProvider: Send + Sync {
    /// Creates the tracking table if it does not exist. Idempotent.
    fn ensure_tracking_storage(&self, table: &TrackingTable) -> StrataResult<()>;

    /// Returns `true` iff a record with this identifier exists.
    fn is_applied(&self, table: &TrackingTable, id: &str) -> StrataResult<bool>;

    /// Returns the total number of records in the tracking table.
    fn count_applied(&self, table: &TrackingTable) -> StrataResult<u64>;

    /// Lists every identifier in the tracking table in insertion order.
    fn applied_ids(&self, table: &TrackingTable) -> StrataResult<AppliedIds<'_>>;

    /// Inserts a record.
    fn record_applied(&self, table: &TrackingTable, record: &MigrationRecord) -> StrataResult<()>;

    /// Deletes the record with this identifier.
    ///
    /// Deleting a record that does not exist is a no-op.
    fn record_reverted(&self, table: &TrackingTable, id: &str) -> StrataResult<()>;

    /// Executes a schema statement on behalf of a migration action.
    fn execute(&self, statement: &str) -> StrataResult<()>;

    /// Begins a transaction. Only called in transactional mode.
    fn begin(&self) -> StrataResult<()>;

    /// Commits the active transaction.
    fn commit(&self) -> StrataResult<()>;

    /// Rolls back the active transaction, discarding every change made since `begin`.
    fn rollback(&self) -> StrataResult<()>;
}

/// High-level handle to a record store.
///
/// # Characteristics
/// - **Cheap to clone**: only the reference count is incremented
/// - **Provider-agnostic**: works with any [`RecordStoreProvider`]
/// - **Ergonomic**: dereferences to the provider
///
/// # Usage Example
/// ```text
/// let store = RecordStore::new(InMemoryStore::new());
/// store.ensure_tracking_storage(&TrackingTable::default())?;
/// ```
#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<dyn RecordStoreProvider>,
}

impl RecordStore {
    pub fn new<T: RecordStoreProvider + 'static>(inner: T) -> Self {
        RecordStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for RecordStore {
    type Target = Arc<dyn RecordStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Debug for RecordStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}
