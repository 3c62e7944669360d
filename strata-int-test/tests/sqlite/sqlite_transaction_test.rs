use super::recorded_ids;
use strata::errors::ErrorKind;
use strata::Migrator;
use strata_int_test::test_util::{cleanup, create_test_context, failing, run_test};

#[test]
fn test_failed_migration_rolls_back_everything() {
    run_test(
        || create_test_context(),
        |ctx| {
            let journal = ctx.journal();
            let migrator = Migrator::builder(ctx.store())
                .use_transaction(true)
                .migrations(vec![
                    journal.create_table("A", "person"),
                    failing("B"),
                    journal.create_table("C", "pet"),
                ])
                .build()?;

            let err = migrator.migrate().unwrap_err();

            assert_eq!(err.kind(), &ErrorKind::ActionFailed);
            // the tracking table was created inside the aborted transaction
            assert!(!ctx.has_table("migrations")?);
            assert!(recorded_ids(&ctx)?.is_empty());
            assert!(!ctx.has_table("person")?);
            assert!(!ctx.has_table("pet")?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    );
}

#[test]
fn test_failed_migration_without_transaction_keeps_prefix() {
    run_test(
        || create_test_context(),
        |ctx| {
            let journal = ctx.journal();
            let migrator = Migrator::builder(ctx.store())
                .migrations(vec![
                    journal.create_table("A", "person"),
                    failing("B"),
                    journal.create_table("C", "pet"),
                ])
                .build()?;

            let err = migrator.migrate().unwrap_err();

            assert_eq!(err.kind(), &ErrorKind::ActionFailed);
            assert_eq!(recorded_ids(&ctx)?, vec!["A"]);
            assert!(ctx.has_table("person")?);
            assert!(!ctx.has_table("pet")?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    );
}

#[test]
fn test_sql_error_in_transaction_rolls_back() {
    run_test(
        || create_test_context(),
        |ctx| {
            let journal = ctx.journal();
            let migrator = Migrator::builder(ctx.store())
                .use_transaction(true)
                .migrations(vec![
                    journal.create_table("A", "person"),
                    journal.create_table("B", "person"),
                ])
                .build()?;

            let err = migrator.migrate().unwrap_err();

            assert_eq!(err.kind(), &ErrorKind::ActionFailed);
            assert_eq!(err.root_kind(), &ErrorKind::StoreError);
            assert!(!ctx.has_table("migrations")?);
            assert!(!ctx.has_table("person")?);
            assert!(recorded_ids(&ctx)?.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    );
}

#[test]
fn test_failed_migration_keeps_existing_history() {
    run_test(
        || create_test_context(),
        |ctx| {
            let journal = ctx.journal();
            Migrator::builder(ctx.store())
                .add_migration(journal.create_table("A", "person"))
                .build()?
                .migrate()?;

            let migrator = Migrator::builder(ctx.store())
                .use_transaction(true)
                .migrations(vec![
                    journal.create_table("A", "person"),
                    journal.create_table("B", "pet"),
                    failing("C"),
                ])
                .build()?;
            let err = migrator.migrate().unwrap_err();

            assert_eq!(err.kind(), &ErrorKind::ActionFailed);
            assert!(ctx.has_table("migrations")?);
            assert!(ctx.has_table("person")?);
            assert!(!ctx.has_table("pet")?);
            assert_eq!(recorded_ids(&ctx)?, vec!["A"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    );
}

#[test]
fn test_transactional_migrate_then_rollback() {
    run_test(
        || create_test_context(),
        |ctx| {
            let journal = ctx.journal();
            let migrator = Migrator::builder(ctx.store())
                .use_transaction(true)
                .migrations(vec![
                    journal.create_table("A", "person"),
                    journal.create_table("B", "pet"),
                ])
                .build()?;

            migrator.migrate()?;
            migrator.rollback_to("A")?;

            assert!(ctx.has_table("person")?);
            assert!(!ctx.has_table("pet")?);
            assert_eq!(recorded_ids(&ctx)?, vec!["A"]);

            // the connection is back in autocommit mode
            ctx.sqlite().with_connection(|c| assert!(c.is_autocommit()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    );
}

#[test]
fn test_irreversible_rollback_in_transaction_restores_tables() {
    run_test(
        || create_test_context(),
        |ctx| {
            let journal = ctx.journal();
            let migrator = Migrator::builder(ctx.store())
                .use_transaction(true)
                .migrations(vec![
                    journal.create_table("A", "person"),
                    journal.irreversible("B"),
                    journal.create_table("C", "pet"),
                ])
                .build()?;

            migrator.migrate()?;
            let err = migrator.rollback_to("A").unwrap_err();

            assert_eq!(err.kind(), &ErrorKind::RollbackImpossible);
            assert!(ctx.has_table("pet")?);
            assert_eq!(recorded_ids(&ctx)?, vec!["A", "B", "C"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    );
}
