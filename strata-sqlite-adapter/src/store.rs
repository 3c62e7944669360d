use crate::error::{SqliteStoreError, SqliteStoreResult};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use strata::config::TrackingTable;
use strata::errors::StrataResult;
use strata::store::{AppliedIds, MigrationRecord, RecordStoreProvider};

/// SQLite implementation of a record store.
///
/// # Purpose
/// Keeps the tracking table in a SQLite database and runs migration
/// statements on the same connection, so schema changes and tracking
/// records share SQLite's transactions.
///
/// # Characteristics
/// - **One connection**: all calls are serialized through a mutex
/// - **Transactional DDL**: SQLite can roll back `CREATE`/`DROP`, so
///   transactional mode is safe to enable
/// - **Shared**: clones use the same connection
///
/// # Tracking table
/// ```text
/// CREATE TABLE IF NOT EXISTS "migrations" ("id" VARCHAR(255) PRIMARY KEY, "description" TEXT)
/// ```
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<SqliteStoreInner>,
}

impl SqliteStore {
    /// Opens (or creates) a database file.
    pub fn open<P: AsRef<Path>>(path: P) -> StrataResult<SqliteStore> {
        let connection = Connection::open(path).map_err(SqliteStoreError::from)?;
        Ok(Self::from_connection(connection))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StrataResult<SqliteStore> {
        let connection = Connection::open_in_memory().map_err(SqliteStoreError::from)?;
        Ok(Self::from_connection(connection))
    }

    /// Wraps an already configured connection.
    pub fn from_connection(connection: Connection) -> SqliteStore {
        SqliteStore {
            inner: Arc::new(SqliteStoreInner {
                connection: Mutex::new(connection),
            }),
        }
    }

    /// Runs `f` with the underlying connection.
    ///
    /// The connection lock is held while `f` runs and it is not reentrant,
    /// so `f` must not call back into this store or any of its clones.
    pub fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> R) -> R {
        let connection = self.inner.connection.lock();
        f(&connection)
    }

    /// Returns `true` if a table of this name exists.
    pub fn has_table(&self, table_name: &str) -> StrataResult<bool> {
        Ok(self.inner.has_table(table_name)?)
    }

    /// Returns the records of a tracking table in insertion order.
    pub fn records(&self, table: &TrackingTable) -> StrataResult<Vec<MigrationRecord>> {
        Ok(self.inner.records(table)?)
    }
}

impl RecordStoreProvider for SqliteStore {
    fn ensure_tracking_storage(&self, table: &TrackingTable) -> StrataResult<()> {
        Ok(self.inner.ensure_table(table)?)
    }

    fn is_applied(&self, table: &TrackingTable, id: &str) -> StrataResult<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            quote(&table.name),
            quote(&table.id_column)
        );
        let count = self.inner.count(&sql, id)?;
        Ok(count > 0)
    }

    fn count_applied(&self, table: &TrackingTable) -> StrataResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(&table.name));
        let connection = self.inner.connection.lock();
        let count: i64 = connection
            .query_row(&sql, [], |row| row.get(0))
            .map_err(SqliteStoreError::from)?;
        Ok(count as u64)
    }

    fn applied_ids(&self, table: &TrackingTable) -> StrataResult<AppliedIds<'_>> {
        let ids = self.inner.ids(table)?;
        Ok(Box::new(ids.into_iter().map(Ok)))
    }

    fn record_applied(&self, table: &TrackingTable, record: &MigrationRecord) -> StrataResult<()> {
        table.check_id_length(record.id())?;
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            quote(&table.name),
            quote(&table.id_column),
            quote(table.description_column())
        );
        let connection = self.inner.connection.lock();
        connection
            .execute(&sql, params![record.id(), record.description()])
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn record_reverted(&self, table: &TrackingTable, id: &str) -> StrataResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote(&table.name),
            quote(&table.id_column)
        );
        let connection = self.inner.connection.lock();
        connection
            .execute(&sql, params![id])
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn execute(&self, statement: &str) -> StrataResult<()> {
        let connection = self.inner.connection.lock();
        connection
            .execute_batch(statement)
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn begin(&self) -> StrataResult<()> {
        Ok(self.inner.begin()?)
    }

    fn commit(&self) -> StrataResult<()> {
        Ok(self.inner.finish("COMMIT")?)
    }

    fn rollback(&self) -> StrataResult<()> {
        Ok(self.inner.finish("ROLLBACK")?)
    }
}

struct SqliteStoreInner {
    connection: Mutex<Connection>,
}

impl SqliteStoreInner {
    fn ensure_table(&self, table: &TrackingTable) -> SqliteStoreResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({} VARCHAR({}) PRIMARY KEY, {} TEXT)",
            quote(&table.name),
            quote(&table.id_column),
            table.id_column_size,
            quote(table.description_column())
        );
        let connection = self.connection.lock();
        connection.execute_batch(&sql)?;
        Ok(())
    }

    fn has_table(&self, table_name: &str) -> SqliteStoreResult<bool> {
        let connection = self.connection.lock();
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn count(&self, sql: &str, id: &str) -> SqliteStoreResult<i64> {
        let connection = self.connection.lock();
        let count = connection.query_row(sql, params![id], |row| row.get(0))?;
        Ok(count)
    }

    fn ids(&self, table: &TrackingTable) -> SqliteStoreResult<Vec<String>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            quote(&table.id_column),
            quote(&table.name)
        );
        let connection = self.connection.lock();
        let mut statement = connection.prepare(&sql)?;
        let ids = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn records(&self, table: &TrackingTable) -> SqliteStoreResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT {}, {} FROM {} ORDER BY rowid",
            quote(&table.id_column),
            quote(table.description_column()),
            quote(&table.name)
        );
        let connection = self.connection.lock();
        let mut statement = connection.prepare(&sql)?;
        let records = statement
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let description: Option<String> = row.get(1)?;
                Ok(MigrationRecord::new(&id, description.as_deref()))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn begin(&self) -> SqliteStoreResult<()> {
        let connection = self.connection.lock();
        if !connection.is_autocommit() {
            log::error!("Cannot begin a transaction, one is already active");
            return Err(SqliteStoreError::TransactionActive);
        }
        connection.execute_batch("BEGIN")?;
        Ok(())
    }

    fn finish(&self, statement: &str) -> SqliteStoreResult<()> {
        let connection = self.connection.lock();
        if connection.is_autocommit() {
            return Err(SqliteStoreError::NoTransaction);
        }
        connection.execute_batch(statement)?;
        Ok(())
    }
}

/// Quotes an SQL identifier.
fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
