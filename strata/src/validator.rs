//! Registry validation run before any store interaction.

use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::migration::Migration;
use crate::INIT_SCHEMA_MIGRATION_ID;
use std::collections::HashSet;

/// Checks a registry for reserved and duplicated identifiers.
///
/// Reserved identifiers are reported before duplicates. For duplicates the
/// first repeated identifier, scanning in registry order, is reported.
pub fn validate(migrations: &[Migration]) -> StrataResult<()> {
    check_reserved_ids(migrations)?;
    check_duplicated_ids(migrations)
}

fn check_reserved_ids(migrations: &[Migration]) -> StrataResult<()> {
    if let Some(m) = migrations.iter().find(|m| m.id() == INIT_SCHEMA_MIGRATION_ID) {
        log::error!("Migration uses the reserved ID '{}'", m.id());
        return Err(StrataError::new(
            &format!("Reserved migration ID: \"{}\"", m.id()),
            ErrorKind::ReservedIdentifier(m.id().to_string()),
        ));
    }
    Ok(())
}

fn check_duplicated_ids(migrations: &[Migration]) -> StrataResult<()> {
    let mut seen = HashSet::with_capacity(migrations.len());
    for m in migrations {
        if !seen.insert(m.id()) {
            log::error!("Migration ID '{}' is defined more than once", m.id());
            return Err(StrataError::new(
                &format!("Duplicated migration ID: \"{}\"", m.id()),
                ErrorKind::DuplicateIdentifier(m.id().to_string()),
            ));
        }
    }
    Ok(())
}
