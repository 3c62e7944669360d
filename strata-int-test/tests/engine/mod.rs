mod init_schema_test;
mod validation_test;

use strata::config::DEFAULT_TABLE_NAME;
use strata::store::memory::InMemoryStore;

/// Identifiers recorded in the default tracking table, in creation order.
pub fn recorded_ids(memory: &InMemoryStore) -> Vec<String> {
    memory
        .records(DEFAULT_TABLE_NAME)
        .iter()
        .map(|r| r.id().to_string())
        .collect()
}
