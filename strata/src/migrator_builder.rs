use crate::config::StrataConfig;
use crate::errors::{StrataError, StrataResult};
use crate::migration::{Action, Migration};
use crate::migrator::Migrator;
use crate::session::Session;
use crate::store::RecordStore;

/// Builder for creating and configuring a [`Migrator`].
///
/// `MigratorBuilder` provides a fluent API for configuring the engine. It
/// captures the first configuration error and returns it from
/// [`build`](Self::build); once an error is captured, later setters are
/// ignored.
///
/// # Examples
///
/// ```rust,ignore
/// use strata::{Migrator, Migration};
/// use strata::store::{RecordStore, memory::InMemoryStore};
///
/// let migrator = Migrator::builder(RecordStore::new(InMemoryStore::new()))
///     .table_name("schema_migrations")
///     .use_transaction(true)
///     .add_migration(Migration::new("201608301400", |s| {
///         s.execute("CREATE TABLE person (name TEXT)")
///     }))
///     .build()?;
/// ```
pub struct MigratorBuilder {
    error: Option<StrataError>,
    store: RecordStore,
    config: StrataConfig,
    migrations: Vec<Migration>,
    init_schema: Option<Action>,
}

impl MigratorBuilder {
    /// Creates a builder with the default configuration and an empty registry.
    pub fn new(store: RecordStore) -> Self {
        MigratorBuilder {
            error: None,
            store,
            config: StrataConfig::default(),
            migrations: Vec::new(),
            init_schema: None,
        }
    }

    /// Sets the tracking table name. An empty name is a configuration error.
    pub fn table_name(mut self, table_name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_table_name(table_name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the identifier column name. An empty name is a configuration error.
    pub fn id_column_name(mut self, column_name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_id_column_name(column_name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the maximum identifier length. Zero is a configuration error.
    pub fn id_column_size(mut self, size: usize) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_id_column_size(size) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn use_transaction(mut self, enabled: bool) -> Self {
        if self.error.is_none() {
            self.config.set_use_transaction(enabled);
        }
        self
    }

    pub fn validate_unknown_migrations(mut self, enabled: bool) -> Self {
        if self.error.is_none() {
            self.config.set_validate_unknown_migrations(enabled);
        }
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: StrataConfig) -> Self {
        if self.error.is_none() {
            self.config = config;
        }
        self
    }

    /// Appends a migration to the registry.
    pub fn add_migration(mut self, migration: Migration) -> Self {
        if self.error.is_none() {
            self.migrations.push(migration);
        }
        self
    }

    /// Appends several migrations to the registry, keeping their order.
    pub fn migrations<I>(mut self, migrations: I) -> Self
    where
        I: IntoIterator<Item = Migration>,
    {
        if self.error.is_none() {
            self.migrations.extend(migrations);
        }
        self
    }

    /// Sets the fresh-schema initializer.
    pub fn init_schema<F>(mut self, init_schema: F) -> Self
    where
        F: Fn(&Session<'_>) -> StrataResult<()> + Send + Sync + 'static,
    {
        if self.error.is_none() {
            self.init_schema = Some(Action::new(init_schema));
        }
        self
    }

    /// Builds the migrator.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error captured by a setter.
    /// The registry itself is validated when an operation runs.
    pub fn build(self) -> StrataResult<Migrator> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut migrator = Migrator::new(self.store, self.migrations, self.config);
        migrator.set_init_schema_action(self.init_schema);
        Ok(migrator)
    }
}
