//! SQLite record store for the strata migration engine.
//!
//! ```rust,ignore
//! use strata::{Migration, Migrator};
//! use strata::store::RecordStore;
//! use strata_sqlite_adapter::SqliteStore;
//!
//! let store = SqliteStore::open("app.db")?;
//! let migrator = Migrator::builder(RecordStore::new(store))
//!     .use_transaction(true)
//!     .add_migration(Migration::new("201608301400", |s| {
//!         s.execute("CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT)")
//!     }))
//!     .build()?;
//! migrator.migrate()?;
//! ```

mod error;
mod store;

pub use error::*;
pub use store::*;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
