mod sqlite_transaction_test;

use strata::config::TrackingTable;
use strata::errors::StrataResult;
use strata_int_test::test_util::TestContext;

/// Identifiers recorded in the default tracking table, in creation order.
/// A tracking table that does not exist holds no records.
pub fn recorded_ids(ctx: &TestContext) -> StrataResult<Vec<String>> {
    let table = TrackingTable::default();
    if !ctx.has_table(&table.name)? {
        return Ok(Vec::new());
    }
    let records = ctx.sqlite().records(&table)?;
    Ok(records.iter().map(|r| r.id().to_string()).collect())
}
