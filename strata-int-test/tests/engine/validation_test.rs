use super::recorded_ids;
use strata::errors::ErrorKind;
use strata::store::RecordStoreProvider;
use strata::store::MigrationRecord;
use strata::{Migrator, INIT_SCHEMA_MIGRATION_ID};
use strata_int_test::test_util::{memory_store, Journal};

#[test]
fn test_reserved_id_rejected_before_anything_runs() {
    let journal = Journal::new();
    let (memory, store) = memory_store();
    let migrator = Migrator::builder(store)
        .migrations(vec![
            journal.tracked("A"),
            journal.tracked(INIT_SCHEMA_MIGRATION_ID),
        ])
        .build()
        .unwrap();

    let err = migrator.migrate().unwrap_err();

    assert_eq!(
        err.kind(),
        &ErrorKind::ReservedIdentifier(INIT_SCHEMA_MIGRATION_ID.to_string())
    );
    assert!(journal.entries().is_empty());
    assert!(!memory.has_table("migrations"));
}

#[test]
fn test_reserved_id_rejected_by_every_operation() {
    let journal = Journal::new();
    let (memory, store) = memory_store();
    let migrator = Migrator::builder(store)
        .migrations(vec![
            journal.tracked("A"),
            journal.tracked(INIT_SCHEMA_MIGRATION_ID),
        ])
        .build()
        .unwrap();
    let reserved = ErrorKind::ReservedIdentifier(INIT_SCHEMA_MIGRATION_ID.to_string());

    assert_eq!(migrator.migrate_to("A").unwrap_err().kind(), &reserved);
    assert_eq!(migrator.rollback_last().unwrap_err().kind(), &reserved);
    assert_eq!(migrator.rollback_to("A").unwrap_err().kind(), &reserved);
    assert_eq!(
        migrator
            .rollback_migration(&journal.tracked("A"))
            .unwrap_err()
            .kind(),
        &reserved
    );
    assert_eq!(migrator.status().unwrap_err().kind(), &reserved);
    assert!(journal.entries().is_empty());
    assert!(!memory.has_table("migrations"));
}

#[test]
fn test_duplicate_id_applies_nothing() {
    let journal = Journal::new();
    let (memory, store) = memory_store();
    let migrator = Migrator::builder(store)
        .migrations(vec![journal.tracked("A"), journal.tracked("A")])
        .build()
        .unwrap();

    let err = migrator.migrate().unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::DuplicateIdentifier("A".to_string()));
    assert!(journal.entries().is_empty());
    assert!(recorded_ids(&memory).is_empty());
}

#[test]
fn test_unknown_history_applies_nothing() {
    let journal = Journal::new();
    let (memory, store) = memory_store();
    let table = strata::config::TrackingTable::default();
    memory.ensure_tracking_storage(&table).unwrap();
    memory
        .record_applied(&table, &MigrationRecord::new("Z", None))
        .unwrap();

    let migrator = Migrator::builder(store)
        .validate_unknown_migrations(true)
        .use_transaction(true)
        .migrations(vec![journal.tracked("A"), journal.tracked("B")])
        .build()
        .unwrap();

    let err = migrator.migrate().unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::UnknownPastMigration);
    assert!(err.message().contains("Z"));
    assert!(journal.entries().is_empty());
    assert_eq!(recorded_ids(&memory), vec!["Z"]);
    assert!(!memory.in_transaction());
}

#[test]
fn test_unknown_history_ignored_when_disabled() {
    let journal = Journal::new();
    let (memory, store) = memory_store();
    let table = strata::config::TrackingTable::default();
    memory.ensure_tracking_storage(&table).unwrap();
    memory
        .record_applied(&table, &MigrationRecord::new("Z", None))
        .unwrap();

    let migrator = Migrator::builder(store)
        .add_migration(journal.tracked("A"))
        .build()
        .unwrap();

    migrator.migrate().unwrap();

    assert_eq!(journal.entries(), vec!["up:A"]);
    assert_eq!(recorded_ids(&memory), vec!["Z", "A"]);
}

#[test]
fn test_sentinel_is_known_history() {
    let journal = Journal::new();
    let (memory, store) = memory_store();
    let migrator = Migrator::builder(store.clone())
        .add_migration(journal.tracked("A"))
        .init_schema(|s| s.execute("CREATE TABLE person (name TEXT)"))
        .build()
        .unwrap();
    migrator.migrate().unwrap();

    let migrator = Migrator::builder(store)
        .validate_unknown_migrations(true)
        .migrations(vec![journal.tracked("A"), journal.tracked("B")])
        .build()
        .unwrap();
    migrator.migrate().unwrap();

    assert_eq!(journal.entries(), vec!["up:B"]);
    assert_eq!(
        recorded_ids(&memory),
        vec![INIT_SCHEMA_MIGRATION_ID, "A", "B"]
    );
}
