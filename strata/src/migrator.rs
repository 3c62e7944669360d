use crate::config::{StrataConfig, TrackingTable};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::migration::{Action, Migration};
use crate::migrator_builder::MigratorBuilder;
use crate::session::Session;
use crate::store::{MigrationRecord, RecordStore};
use crate::transaction::TransactionScope;
use crate::validator;
use crate::INIT_SCHEMA_MIGRATION_ID;
use std::collections::HashSet;

/// Description stored alongside the schema-init sentinel record.
const INIT_SCHEMA_DESCRIPTION: &str = "schema initialized";

/// Applied state of one registry entry, as reported by [`Migrator::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub id: String,
    pub description: Option<String>,
    pub applied: bool,
}

/// The migration engine.
///
/// # Purpose
/// Owns an ordered registry of [`Migration`]s and drives a [`RecordStore`]
/// to apply them forward or roll them back. The registry order is the
/// chronological application order; the engine never reorders it.
///
/// # Operations
/// - [`migrate`](Self::migrate) applies every pending migration
/// - [`migrate_to`](Self::migrate_to) applies pending migrations up to and including a target
/// - [`rollback_last`](Self::rollback_last) reverts the latest applied migration
/// - [`rollback_to`](Self::rollback_to) reverts everything after a target
/// - [`rollback_migration`](Self::rollback_migration) reverts one given migration
///
/// Every operation validates the registry first, then runs inside one
/// [`TransactionScope`]. With transactional mode enabled, a failure leaves
/// neither schema changes nor tracking records behind. Without it, every
/// migration that succeeded before the failure stays applied and a later
/// call resumes after it.
///
/// # Usage
/// ```ignore
/// let migrator = Migrator::builder(RecordStore::new(InMemoryStore::new()))
///     .use_transaction(true)
///     .add_migration(Migration::new("201608301400", |s| {
///         s.execute("CREATE TABLE person (name TEXT)")
///     }))
///     .build()?;
/// migrator.migrate()?;
/// ```
pub struct Migrator {
    store: RecordStore,
    migrations: Vec<Migration>,
    config: StrataConfig,
    init_schema: Option<Action>,
}

impl Migrator {
    pub fn new(store: RecordStore, migrations: Vec<Migration>, config: StrataConfig) -> Self {
        Migrator {
            store,
            migrations,
            config,
            init_schema: None,
        }
    }

    pub fn builder(store: RecordStore) -> MigratorBuilder {
        MigratorBuilder::new(store)
    }

    /// Sets a function creating the whole schema of a fresh database.
    ///
    /// When the tracking table is empty, `migrate` runs this function once
    /// instead of the individual migrations and marks all of them as applied.
    pub fn set_init_schema<F>(&mut self, init_schema: F)
    where
        F: Fn(&Session<'_>) -> StrataResult<()> + Send + Sync + 'static,
    {
        self.init_schema = Some(Action::new(init_schema));
    }

    pub(crate) fn set_init_schema_action(&mut self, action: Option<Action>) {
        self.init_schema = action;
    }

    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Applies every migration that has not run yet.
    ///
    /// # Errors
    ///
    /// Returns `NoMigrationDefined` if the registry is empty and no schema
    /// initializer is set, registry validation errors, and any store or
    /// action failure.
    pub fn migrate(&self) -> StrataResult<()> {
        if !self.has_migrations() {
            return Err(no_migration_defined());
        }
        let target = self.migrations.last().map(|m| m.id().to_string());
        self.run_migrations(target.as_deref())
    }

    /// Applies pending migrations up to and including `migration_id`.
    ///
    /// # Errors
    ///
    /// Returns `MigrationIdNotFound` if no migration of the registry has this
    /// identifier, plus everything [`migrate`](Self::migrate) can return.
    pub fn migrate_to(&self, migration_id: &str) -> StrataResult<()> {
        self.check_id_exists(migration_id)?;
        self.run_migrations(Some(migration_id))
    }

    /// Rolls back the latest applied migration of the registry.
    ///
    /// Registry order approximates recency: the last registry entry that is
    /// marked applied is the one reverted.
    pub fn rollback_last(&self) -> StrataResult<()> {
        if self.migrations.is_empty() {
            return Err(no_migration_defined());
        }
        validator::validate(&self.migrations)?;

        let scope = TransactionScope::begin(&self.store, self.config.use_transaction())?;
        let session = Session::new(&self.store, &self.config, scope.is_transactional());
        let table = self.config.tracking_table();
        self.store.ensure_tracking_storage(&table)?;

        let last = self.last_applied_migration(&table)?;
        self.revert(last, &session, &table)?;
        scope.commit()
    }

    /// Rolls back every applied migration defined after `migration_id`.
    ///
    /// Migrations are reverted from the end of the registry towards the
    /// target; the target itself stays applied.
    pub fn rollback_to(&self, migration_id: &str) -> StrataResult<()> {
        if self.migrations.is_empty() {
            return Err(no_migration_defined());
        }
        self.check_id_exists(migration_id)?;
        validator::validate(&self.migrations)?;

        let scope = TransactionScope::begin(&self.store, self.config.use_transaction())?;
        let session = Session::new(&self.store, &self.config, scope.is_transactional());
        let table = self.config.tracking_table();
        self.store.ensure_tracking_storage(&table)?;

        for migration in self.migrations.iter().rev() {
            if migration.id() == migration_id {
                break;
            }
            if self.store.is_applied(&table, migration.id())? {
                self.revert(migration, &session, &table)?;
            }
        }
        scope.commit()
    }

    /// Rolls back one migration, regardless of its position in the registry.
    pub fn rollback_migration(&self, migration: &Migration) -> StrataResult<()> {
        validator::validate(&self.migrations)?;

        let scope = TransactionScope::begin(&self.store, self.config.use_transaction())?;
        let session = Session::new(&self.store, &self.config, scope.is_transactional());
        let table = self.config.tracking_table();
        self.store.ensure_tracking_storage(&table)?;

        self.revert(migration, &session, &table)?;
        scope.commit()
    }

    /// Reports, in registry order, which migrations are applied.
    ///
    /// Creates the tracking table if it does not exist yet.
    pub fn status(&self) -> StrataResult<Vec<MigrationStatus>> {
        validator::validate(&self.migrations)?;

        let table = self.config.tracking_table();
        self.store.ensure_tracking_storage(&table)?;

        self.migrations
            .iter()
            .map(|m| -> StrataResult<MigrationStatus> {
                Ok(MigrationStatus {
                    id: m.id().to_string(),
                    description: m.description().map(|d| d.to_string()),
                    applied: self.store.is_applied(&table, m.id())?,
                })
            })
            .collect()
    }

    fn run_migrations(&self, target_id: Option<&str>) -> StrataResult<()> {
        if !self.has_migrations() {
            return Err(no_migration_defined());
        }
        validator::validate(&self.migrations)?;

        let scope = TransactionScope::begin(&self.store, self.config.use_transaction())?;
        let session = Session::new(&self.store, &self.config, scope.is_transactional());
        let table = self.config.tracking_table();
        self.store.ensure_tracking_storage(&table)?;

        if self.config.validate_unknown_migrations() {
            self.check_unknown_migrations(&table)?;
        }

        if let Some(init_schema) = &self.init_schema {
            if self.can_initialize_schema(&table)? {
                self.run_init_schema(init_schema, &session, &table)?;
                return scope.commit();
            }
        }

        for migration in &self.migrations {
            self.run_migration(migration, &session, &table)?;
            if let Some(target) = target_id {
                if !target.is_empty() && migration.id() == target {
                    break;
                }
            }
        }
        scope.commit()
    }

    fn run_migration(
        &self,
        migration: &Migration,
        session: &Session<'_>,
        table: &TrackingTable,
    ) -> StrataResult<()> {
        if migration.id().is_empty() {
            return Err(missing_id());
        }

        if self.store.is_applied(table, migration.id())? {
            log::debug!("Migration {} already applied, skipping", migration.id());
            return Ok(());
        }

        migration.migrate_action().run(session).map_err(|e| {
            log::error!("Migration {} failed: {}", migration.id(), e);
            StrataError::new_with_cause(
                &format!("Migration {} failed", migration.id()),
                ErrorKind::ActionFailed,
                e,
            )
        })?;

        self.store.record_applied(
            table,
            &MigrationRecord::new(migration.id(), migration.description()),
        )?;
        log::info!("Applied migration {}", migration.id());
        Ok(())
    }

    fn revert(
        &self,
        migration: &Migration,
        session: &Session<'_>,
        table: &TrackingTable,
    ) -> StrataResult<()> {
        let rollback = match migration.rollback_action() {
            Some(rollback) => rollback,
            None => {
                log::error!("Migration {} has no rollback action", migration.id());
                return Err(StrataError::new(
                    &format!("It's impossible to rollback migration {}", migration.id()),
                    ErrorKind::RollbackImpossible,
                ));
            }
        };

        rollback.run(session).map_err(|e| {
            log::error!("Rollback of migration {} failed: {}", migration.id(), e);
            StrataError::new_with_cause(
                &format!("Rollback of migration {} failed", migration.id()),
                ErrorKind::ActionFailed,
                e,
            )
        })?;

        self.store.record_reverted(table, migration.id())?;
        log::info!("Rolled back migration {}", migration.id());
        Ok(())
    }

    fn run_init_schema(
        &self,
        init_schema: &Action,
        session: &Session<'_>,
        table: &TrackingTable,
    ) -> StrataResult<()> {
        if self.migrations.iter().any(|m| m.id().is_empty()) {
            return Err(missing_id());
        }

        init_schema.run(session).map_err(|e| {
            log::error!("Schema initialization failed: {}", e);
            StrataError::new_with_cause(
                "Schema initialization failed",
                ErrorKind::ActionFailed,
                e,
            )
        })?;

        self.store.record_applied(
            table,
            &MigrationRecord::new(INIT_SCHEMA_MIGRATION_ID, Some(INIT_SCHEMA_DESCRIPTION)),
        )?;
        for migration in &self.migrations {
            self.store.record_applied(
                table,
                &MigrationRecord::new(migration.id(), migration.description()),
            )?;
        }

        log::info!(
            "Initialized schema, marked {} migrations as applied",
            self.migrations.len()
        );
        Ok(())
    }

    /// The schema can be initialized only if it has not been initialized yet
    /// and no migration has been applied.
    fn can_initialize_schema(&self, table: &TrackingTable) -> StrataResult<bool> {
        if self.store.is_applied(table, INIT_SCHEMA_MIGRATION_ID)? {
            return Ok(false);
        }
        Ok(self.store.count_applied(table)? == 0)
    }

    fn check_unknown_migrations(&self, table: &TrackingTable) -> StrataResult<()> {
        let mut known: HashSet<&str> = self.migrations.iter().map(|m| m.id()).collect();
        known.insert(INIT_SCHEMA_MIGRATION_ID);

        for id in self.store.applied_ids(table)? {
            let id = id?;
            if !known.contains(id.as_str()) {
                log::error!("Tracking table contains unknown migration {}", id);
                return Err(StrataError::new(
                    &format!("Unknown past migration found in database: {}", id),
                    ErrorKind::UnknownPastMigration,
                ));
            }
        }
        Ok(())
    }

    fn last_applied_migration(&self, table: &TrackingTable) -> StrataResult<&Migration> {
        for migration in self.migrations.iter().rev() {
            if self.store.is_applied(table, migration.id())? {
                return Ok(migration);
            }
        }
        Err(StrataError::new(
            "Could not find last run migration",
            ErrorKind::NoAppliedMigration,
        ))
    }

    fn check_id_exists(&self, migration_id: &str) -> StrataResult<()> {
        if self.migrations.iter().any(|m| m.id() == migration_id) {
            return Ok(());
        }
        log::error!("Migration {} is not defined", migration_id);
        Err(StrataError::new(
            &format!("Tried to migrate to an ID that doesn't exist: {}", migration_id),
            ErrorKind::MigrationIdNotFound,
        ))
    }

    /// There is something to apply if either a schema initializer is set
    /// or the registry is not empty.
    fn has_migrations(&self) -> bool {
        self.init_schema.is_some() || !self.migrations.is_empty()
    }
}

fn no_migration_defined() -> StrataError {
    StrataError::new("No migration defined", ErrorKind::NoMigrationDefined)
}

fn missing_id() -> StrataError {
    StrataError::new("Missing ID in migration", ErrorKind::MissingIdentifier)
}
