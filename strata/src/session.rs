use crate::config::StrataConfig;
use crate::errors::StrataResult;
use crate::store::RecordStore;

/// Execution handle passed to every migration action.
///
/// A session gives migration, rollback and schema-init actions access to
/// the store the engine is driving. When transactional mode is enabled the
/// session is bound to the operation's open transaction, so whatever an
/// action executes commits or rolls back together with the tracking records.
///
/// # Usage
/// ```ignore
/// Migration::new("201608301400", |session| {
///     session.execute("CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT)")
/// })
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    store: &'a RecordStore,
    config: &'a StrataConfig,
    transactional: bool,
}

impl<'a> Session<'a> {
    pub(crate) fn new(
        store: &'a RecordStore,
        config: &'a StrataConfig,
        transactional: bool,
    ) -> Self {
        Session {
            store,
            config,
            transactional,
        }
    }

    /// Executes a schema statement against the store.
    pub fn execute(&self, statement: &str) -> StrataResult<()> {
        log::debug!("Executing statement: {}", statement);
        self.store.execute(statement)
    }

    /// Runs several statements in order, stopping at the first failure.
    pub fn execute_all<I, S>(&self, statements: I) -> StrataResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for statement in statements {
            self.execute(statement.as_ref())?;
        }
        Ok(())
    }

    /// Gives direct access to the record store.
    pub fn store(&self) -> &'a RecordStore {
        self.store
    }

    pub fn config(&self) -> &'a StrataConfig {
        self.config
    }

    /// Returns `true` if the session runs inside an engine transaction.
    pub fn in_transaction(&self) -> bool {
        self.transactional
    }
}
