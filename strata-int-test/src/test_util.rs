use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::{env, fs};
use strata::errors::{ErrorKind, StrataError, StrataResult};
use strata::store::memory::InMemoryStore;
use strata::store::RecordStore;
use strata::Migration;
use strata_sqlite_adapter::SqliteStore;

/// Runs a test between a setup and a teardown step.
/// The teardown runs even when the test fails, then the failure is reported.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> StrataResult<()>,
    B: Fn() -> StrataResult<TestContext>,
    A: Fn(TestContext) -> StrataResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let test_ctx = ctx.clone();
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| test(test_ctx)));
    let after_result = after(ctx);

    match result {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic_err) => std::panic::resume_unwind(panic_err),
    }

    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    path: String,
    sqlite: SqliteStore,
    journal: Journal,
}

impl TestContext {
    pub fn new(path: String, sqlite: SqliteStore) -> Self {
        Self {
            path,
            sqlite,
            journal: Journal::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn sqlite(&self) -> SqliteStore {
        self.sqlite.clone()
    }

    pub fn store(&self) -> RecordStore {
        RecordStore::new(self.sqlite.clone())
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Returns `true` if the database has a table of this name.
    pub fn has_table(&self, name: &str) -> StrataResult<bool> {
        self.sqlite.has_table(name)
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    let temp_dir = env::temp_dir();
    temp_dir
        .join(format!("strata-{}.db", id))
        .to_string_lossy()
        .to_string()
}

/// Opens a fresh SQLite database in a random temporary file.
pub fn create_test_context() -> StrataResult<TestContext> {
    let path = random_path();
    if std::path::Path::new(&path).exists() {
        fs::remove_file(&path)?;
    }

    let sqlite = SqliteStore::open(&path).map_err(|e| {
        StrataError::new_with_cause(
            "Failed to create test context",
            ErrorKind::InternalError,
            e,
        )
    })?;
    Ok(TestContext::new(path, sqlite))
}

/// Removes the database file of a test context.
pub fn cleanup(ctx: TestContext) -> StrataResult<()> {
    let path = ctx.path().to_string();
    drop(ctx);

    if std::path::Path::new(&path).exists() {
        if let Err(e) = fs::remove_file(&path) {
            eprintln!("Warning: Failed to remove database file: {:?}", e);
        }
    }
    Ok(())
}

/// Creates an in-memory store and a record store handle sharing it.
pub fn memory_store() -> (InMemoryStore, RecordStore) {
    let memory = InMemoryStore::new();
    let store = RecordStore::new(memory.clone());
    (memory, store)
}

/// Ordered log of the actions run by test migrations.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: &str) {
        self.entries.lock().push(entry.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// A reversible migration that creates `table` and logs `up:<id>`,
    /// and drops it again logging `down:<id>`.
    pub fn create_table(&self, id: &str, table: &str) -> Migration {
        let up_journal = self.clone();
        let down_journal = self.clone();
        let up_id = id.to_string();
        let down_id = id.to_string();
        let create = format!("CREATE TABLE {} (id INTEGER PRIMARY KEY, name TEXT)", table);
        let drop_sql = format!("DROP TABLE {}", table);

        Migration::new(id, move |session| {
            session.execute(&create)?;
            up_journal.push(&format!("up:{}", up_id));
            Ok(())
        })
        .with_rollback(move |session| {
            session.execute(&drop_sql)?;
            down_journal.push(&format!("down:{}", down_id));
            Ok(())
        })
    }

    /// A reversible migration that only logs.
    pub fn tracked(&self, id: &str) -> Migration {
        let up_journal = self.clone();
        let down_journal = self.clone();
        let up_id = id.to_string();
        let down_id = id.to_string();

        Migration::new(id, move |_| {
            up_journal.push(&format!("up:{}", up_id));
            Ok(())
        })
        .with_rollback(move |_| {
            down_journal.push(&format!("down:{}", down_id));
            Ok(())
        })
    }

    /// A migration without rollback action that only logs.
    pub fn irreversible(&self, id: &str) -> Migration {
        let journal = self.clone();
        let up_id = id.to_string();

        Migration::new(id, move |_| {
            journal.push(&format!("up:{}", up_id));
            Ok(())
        })
    }
}

/// A migration whose forward action always fails.
pub fn failing(id: &str) -> Migration {
    Migration::new(id, |_| {
        Err(StrataError::new("boom", ErrorKind::InternalError))
    })
}

/// The person and pet tables used throughout the integration tests.
pub fn person_and_pet(journal: &Journal) -> Vec<Migration> {
    vec![
        journal.create_table("201608301400", "person"),
        journal.create_table("201608301430", "pet"),
    ]
}
