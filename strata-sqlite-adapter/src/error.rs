use strata::errors::{ErrorKind, StrataError};
use thiserror::Error;

/// Error type for SQLite store operations.
#[derive(Error, Debug)]
pub enum SqliteStoreError {
    /// The SQLite driver reported an error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A transaction was started while another one is open
    #[error("A transaction is already active")]
    TransactionActive,
    /// Commit or rollback was requested without an open transaction
    #[error("No active transaction")]
    NoTransaction,
}

impl From<SqliteStoreError> for StrataError {
    fn from(err: SqliteStoreError) -> Self {
        let kind = match err {
            SqliteStoreError::Sqlite(_) => ErrorKind::StoreError,
            SqliteStoreError::TransactionActive | SqliteStoreError::NoTransaction => {
                ErrorKind::TransactionError
            }
        };
        StrataError::new(&err.to_string(), kind)
    }
}

/// Result type for SQLite store internals.
pub type SqliteStoreResult<T> = Result<T, SqliteStoreError>;
