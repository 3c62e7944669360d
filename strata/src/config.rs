//! Configuration of the migration engine and its tracking table.

use crate::errors::{ErrorKind, StrataError, StrataResult};

/// Default name of the table holding applied migration identifiers.
pub const DEFAULT_TABLE_NAME: &str = "migrations";
/// Default name of the identifier column of the tracking table.
pub const DEFAULT_ID_COLUMN_NAME: &str = "id";
/// Default maximum length of a migration identifier.
pub const DEFAULT_ID_COLUMN_SIZE: usize = 255;
/// Name of the informational description column of the tracking table.
pub const DESCRIPTION_COLUMN_NAME: &str = "description";

/// Engine configuration.
///
/// Controls how the tracking table is named and shaped, whether every
/// top-level operation runs inside a single transaction, and whether the
/// tracking table is checked for identifiers the registry does not know.
///
/// # Examples
///
/// ```rust,ignore
/// use strata::config::StrataConfig;
///
/// let mut config = StrataConfig::default();
/// config.set_table_name("schema_migrations")?;
/// config.set_use_transaction(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrataConfig {
    table_name: String,
    id_column_name: String,
    id_column_size: usize,
    use_transaction: bool,
    validate_unknown_migrations: bool,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StrataConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        StrataConfig {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            id_column_name: DEFAULT_ID_COLUMN_NAME.to_string(),
            id_column_size: DEFAULT_ID_COLUMN_SIZE,
            use_transaction: false,
            validate_unknown_migrations: false,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Sets the tracking table name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the name is empty.
    pub fn set_table_name(&mut self, table_name: &str) -> StrataResult<()> {
        if table_name.trim().is_empty() {
            log::error!("Tracking table name cannot be empty");
            return Err(StrataError::new(
                "Tracking table name cannot be empty",
                ErrorKind::InvalidConfiguration,
            ));
        }
        self.table_name = table_name.to_string();
        Ok(())
    }

    pub fn id_column_name(&self) -> &str {
        &self.id_column_name
    }

    /// Sets the identifier column name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the name is empty.
    pub fn set_id_column_name(&mut self, column_name: &str) -> StrataResult<()> {
        if column_name.trim().is_empty() {
            log::error!("Identifier column name cannot be empty");
            return Err(StrataError::new(
                "Identifier column name cannot be empty",
                ErrorKind::InvalidConfiguration,
            ));
        }
        self.id_column_name = column_name.to_string();
        Ok(())
    }

    pub fn id_column_size(&self) -> usize {
        self.id_column_size
    }

    /// Sets the maximum identifier length.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the size is zero.
    pub fn set_id_column_size(&mut self, size: usize) -> StrataResult<()> {
        if size == 0 {
            log::error!("Identifier column size must be greater than zero");
            return Err(StrataError::new(
                "Identifier column size must be greater than zero",
                ErrorKind::InvalidConfiguration,
            ));
        }
        self.id_column_size = size;
        Ok(())
    }

    pub fn use_transaction(&self) -> bool {
        self.use_transaction
    }

    /// Wraps each top-level operation in one transaction when enabled.
    ///
    /// Not every backend can run schema statements inside a transaction;
    /// leave this disabled for those.
    pub fn set_use_transaction(&mut self, enabled: bool) {
        self.use_transaction = enabled;
    }

    pub fn validate_unknown_migrations(&self) -> bool {
        self.validate_unknown_migrations
    }

    /// Fails migrations when the tracking table holds identifiers
    /// that are neither in the registry nor the schema-init sentinel.
    pub fn set_validate_unknown_migrations(&mut self, enabled: bool) {
        self.validate_unknown_migrations = enabled;
    }

    /// Describes the tracking table for record store calls.
    pub fn tracking_table(&self) -> TrackingTable {
        TrackingTable {
            name: self.table_name.clone(),
            id_column: self.id_column_name.clone(),
            id_column_size: self.id_column_size,
        }
    }
}

/// Shape of the tracking table as seen by a record store.
///
/// Every record store call receives the table explicitly, so reads, inserts
/// and deletes always target the configured table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingTable {
    pub name: String,
    pub id_column: String,
    pub id_column_size: usize,
}

impl TrackingTable {
    pub fn description_column(&self) -> &str {
        DESCRIPTION_COLUMN_NAME
    }

    /// Checks an identifier against the column size limit.
    pub fn check_id_length(&self, id: &str) -> StrataResult<()> {
        let length = id.chars().count();
        if length > self.id_column_size {
            log::error!(
                "Migration ID '{}' is {} characters long, column '{}' allows {}",
                id,
                length,
                self.id_column,
                self.id_column_size
            );
            return Err(StrataError::new(
                &format!(
                    "Migration ID '{}' exceeds the maximum length of {} characters",
                    id, self.id_column_size
                ),
                ErrorKind::StoreError,
            ));
        }
        Ok(())
    }
}

impl Default for TrackingTable {
    fn default() -> Self {
        StrataConfig::default().tracking_table()
    }
}
