use super::recorded_ids;
use parking_lot::Mutex;
use std::sync::Arc;
use strata::errors::{ErrorKind, StrataError};
use strata::{Migrator, INIT_SCHEMA_MIGRATION_ID};
use strata_int_test::test_util::{memory_store, Journal};

#[test]
fn test_fresh_schema_runs_initializer_once() {
    let journal = Journal::new();
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let (memory, store) = memory_store();
    let migrator = Migrator::builder(store)
        .migrations(vec![journal.tracked("A"), journal.tracked("B")])
        .init_schema(move |s| {
            *counter.lock() += 1;
            s.execute("CREATE TABLE person (name TEXT)")
        })
        .build()
        .unwrap();

    migrator.migrate().unwrap();
    migrator.migrate().unwrap();

    assert_eq!(*calls.lock(), 1);
    assert!(journal.entries().is_empty());
    assert_eq!(memory.statements(), vec!["CREATE TABLE person (name TEXT)"]);
    assert_eq!(
        recorded_ids(&memory),
        vec![INIT_SCHEMA_MIGRATION_ID, "A", "B"]
    );
}

#[test]
fn test_initializer_skipped_when_history_exists() {
    let journal = Journal::new();
    let (memory, store) = memory_store();
    Migrator::builder(store.clone())
        .add_migration(journal.tracked("A"))
        .build()
        .unwrap()
        .migrate()
        .unwrap();
    journal.clear();

    let migrator = Migrator::builder(store)
        .migrations(vec![journal.tracked("A"), journal.tracked("B")])
        .init_schema(|s| s.execute("CREATE TABLE everything (name TEXT)"))
        .build()
        .unwrap();
    migrator.migrate().unwrap();

    assert_eq!(journal.entries(), vec!["up:B"]);
    assert!(memory.statements().is_empty());
    assert_eq!(recorded_ids(&memory), vec!["A", "B"]);
}

#[test]
fn test_migrate_to_on_fresh_schema_marks_whole_registry() {
    let journal = Journal::new();
    let (memory, store) = memory_store();
    let migrator = Migrator::builder(store)
        .migrations(vec![journal.tracked("A"), journal.tracked("B")])
        .init_schema(|_| Ok(()))
        .build()
        .unwrap();

    migrator.migrate_to("A").unwrap();

    assert!(journal.entries().is_empty());
    assert_eq!(
        recorded_ids(&memory),
        vec![INIT_SCHEMA_MIGRATION_ID, "A", "B"]
    );
}

#[test]
fn test_sentinel_description() {
    let (memory, store) = memory_store();
    let migrator = Migrator::builder(store)
        .init_schema(|_| Ok(()))
        .build()
        .unwrap();

    migrator.migrate().unwrap();

    let records = memory.records("migrations");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id(), INIT_SCHEMA_MIGRATION_ID);
    assert!(records[0].description().is_some());
}

#[test]
fn test_failing_initializer_in_transaction() {
    let journal = Journal::new();
    let (memory, store) = memory_store();
    let migrator = Migrator::builder(store)
        .use_transaction(true)
        .add_migration(journal.tracked("A"))
        .init_schema(|s| {
            s.execute("CREATE TABLE person (name TEXT)")?;
            Err(StrataError::new("disk full", ErrorKind::IOError))
        })
        .build()
        .unwrap();

    let err = migrator.migrate().unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::ActionFailed);
    assert_eq!(err.root_kind(), &ErrorKind::IOError);
    assert!(memory.statements().is_empty());
    assert!(recorded_ids(&memory).is_empty());
}

#[test]
fn test_initializer_rejects_empty_ids() {
    let journal = Journal::new();
    let (memory, store) = memory_store();
    let migrator = Migrator::builder(store)
        .add_migration(journal.tracked(""))
        .init_schema(|s| s.execute("CREATE TABLE person (name TEXT)"))
        .build()
        .unwrap();

    let err = migrator.migrate().unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::MissingIdentifier);
    assert!(memory.statements().is_empty());
}
