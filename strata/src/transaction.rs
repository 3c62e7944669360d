//! Transaction scope wrapping one top-level engine operation.

use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::store::RecordStore;
use uuid::Uuid;

/// Represents the state of a transaction scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    /// A transaction is open on the store
    Active,
    /// Transactional mode is off; every write is immediately durable
    Passthrough,
    /// Successfully committed all changes
    Committed,
    /// Transaction rolled back
    Aborted,
}

/// Scoped transaction over a record store.
///
/// # Purpose
/// Binds every mutation made during one engine operation to a single
/// transaction. The scope must be finished with [`commit`](Self::commit);
/// if it goes out of scope while still active, for example because an
/// error was propagated with `?`, the transaction is rolled back.
///
/// # Characteristics
/// - **Explicit commit**: nothing is committed implicitly
/// - **Abort on drop**: an active scope that is dropped rolls back
/// - **Passthrough mode**: when transactional mode is off the scope never
///   touches the store and commit/abort are no-ops
///
/// # Usage
/// ```ignore
/// let scope = TransactionScope::begin(&store, config.use_transaction())?;
/// run_migrations(&store)?; // early return aborts the scope
/// scope.commit()?;
/// ```
pub struct TransactionScope<'a> {
    id: String,
    store: &'a RecordStore,
    state: TransactionState,
}

impl<'a> TransactionScope<'a> {
    /// Opens a scope, beginning a transaction on the store when `enabled`.
    pub fn begin(store: &'a RecordStore, enabled: bool) -> StrataResult<Self> {
        let id = Uuid::new_v4().to_string();
        let state = if enabled {
            store.begin().map_err(|e| {
                StrataError::new_with_cause(
                    "Failed to begin transaction",
                    ErrorKind::TransactionError,
                    e,
                )
            })?;
            log::debug!("Transaction {} started", id);
            TransactionState::Active
        } else {
            TransactionState::Passthrough
        };

        Ok(TransactionScope { id, store, state })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns `true` if the scope holds an open transaction.
    pub fn is_transactional(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Commits the scope.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError` if the store fails to commit. The scope
    /// is then rolled back when it is dropped.
    pub fn commit(mut self) -> StrataResult<()> {
        if self.state != TransactionState::Active {
            return Ok(());
        }

        self.store.commit().map_err(|e| {
            StrataError::new_with_cause(
                "Failed to commit transaction",
                ErrorKind::TransactionError,
                e,
            )
        })?;
        self.state = TransactionState::Committed;
        log::debug!("Transaction {} committed", self.id);
        Ok(())
    }

    /// Aborts the scope, rolling back every change made inside it.
    pub fn abort(mut self) -> StrataResult<()> {
        self.rollback()
    }

    fn rollback(&mut self) -> StrataResult<()> {
        if self.state != TransactionState::Active {
            return Ok(());
        }

        // the scope is finished even if the store refuses the rollback
        self.state = TransactionState::Aborted;
        self.store.rollback().map_err(|e| {
            StrataError::new_with_cause(
                "Failed to roll back transaction",
                ErrorKind::TransactionError,
                e,
            )
        })?;
        log::debug!("Transaction {} rolled back", self.id);
        Ok(())
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if self.state == TransactionState::Active {
            log::warn!("Transaction {} was not committed, rolling back", self.id);
            if let Err(e) = self.rollback() {
                log::error!("Error while rolling back transaction {}: {}", self.id, e);
            }
        }
    }
}
