//! Result-set mapping.

use crate::db::connection::ResultSet;
use crate::error::{PersistError, PersistResult};
use crate::models::Row;

/// Turn a drained result set into rows keyed by upper-cased column name.
///
/// An empty result set is an error, not an empty list: callers of the read
/// path must be prepared for `NoResult` even when an empty answer is
/// legitimate.
pub fn map_result_set(result_set: ResultSet) -> PersistResult<Vec<Row>> {
    if result_set.is_empty() {
        return Err(PersistError::no_result("The query did not return any results"));
    }

    let ResultSet { columns, records } = result_set;
    let rows = records
        .into_iter()
        .map(|record| {
            let mut row = Row::with_capacity(columns.len());
            for (name, value) in columns.iter().zip(record) {
                row.insert(name, value);
            }
            row
        })
        .collect();
    Ok(rows)
}
