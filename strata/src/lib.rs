//! # Strata - Schema Migration Engine
//!
//! Strata applies an ordered list of named schema migrations to a database,
//! records which ones have run, and reverts them on demand. It is a library:
//! the application owns the schema, writes the migrations and chooses the
//! store; Strata decides what runs, in which order, and keeps the tracking
//! table consistent.
//!
//! ## Key Features
//!
//! - **Ordered**: migrations run in registry order and roll back in reverse order
//! - **Idempotent**: applied migrations are skipped, so `migrate` can be re-run safely
//! - **Reversible**: roll back the last migration, down to a target, or a single migration
//! - **Transactional**: optionally bind a whole operation to one transaction
//! - **Fresh databases**: bootstrap an empty database with one schema-init function
//! - **Validated**: reserved, duplicated and unknown identifiers are rejected
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::{Migration, Migrator};
//! use strata::store::{memory::InMemoryStore, RecordStore};
//!
//! # fn main() -> strata::errors::StrataResult<()> {
//! let migrator = Migrator::builder(RecordStore::new(InMemoryStore::new()))
//!     .use_transaction(true)
//!     .add_migration(
//!         Migration::new("201608301400", |s| s.execute("CREATE TABLE person (name TEXT)"))
//!             .with_rollback(|s| s.execute("DROP TABLE person")),
//!     )
//!     .add_migration(
//!         Migration::new("201608301430", |s| s.execute("CREATE TABLE pet (name TEXT)"))
//!             .with_rollback(|s| s.execute("DROP TABLE pet")),
//!     )
//!     .build()?;
//!
//! migrator.migrate()?;
//! migrator.rollback_last()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Engine and tracking table configuration
//! - [`errors`] - Error types and result definitions
//! - [`migration`] - The migration entity and its actions
//! - [`migrator`] - The migration engine
//! - [`migrator_builder`] - Fluent engine construction
//! - [`session`] - Execution handle passed to migration actions
//! - [`store`] - Record store abstraction and the in-memory store
//! - [`transaction`] - Scoped transactions
//! - [`validator`] - Registry validation

pub mod config;
pub mod errors;
pub mod migration;
pub mod migrator;
pub mod migrator_builder;
pub mod session;
pub mod store;
pub mod transaction;
pub mod validator;

pub use migration::Migration;
pub use migrator::{MigrationStatus, Migrator};
pub use migrator_builder::MigratorBuilder;
pub use session::Session;

/// Identifier recorded when a database is bootstrapped by the schema-init
/// function instead of individual migrations. No migration may use it.
pub const INIT_SCHEMA_MIGRATION_ID: &str = "SCHEMA_INIT";

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
