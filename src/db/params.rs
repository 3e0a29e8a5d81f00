//! Parameter binding.
//!
//! Turns a `Statement` into a database-specific sqlx query with every bound
//! `Value` applied in position order.

use crate::error::PersistResult;
use crate::models::{Statement, Value};
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Sqlite};

/// Build a MySQL query from a statement. Fails if a position is unbound.
pub(crate) fn mysql_query(statement: &Statement) -> PersistResult<Query<'_, MySql, MySqlArguments>> {
    let mut query = sqlx::query(statement.text());
    for value in statement.ordered_values()? {
        query = bind_mysql_value(query, value);
    }
    Ok(query)
}

/// Build a SQLite query from a statement. Fails if a position is unbound.
pub(crate) fn sqlite_query(
    statement: &Statement,
) -> PersistResult<Query<'_, Sqlite, SqliteArguments<'_>>> {
    let mut query = sqlx::query(statement.text());
    for value in statement.ordered_values()? {
        query = bind_sqlite_value(query, value);
    }
    Ok(query)
}

fn bind_mysql_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
    }
}

fn bind_sqlite_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_unbound_position_rejected_before_binding() {
        let mut statement = Statement::new("INSERT INTO t(a, b) VALUES(?, ?)").unwrap();
        statement.set_parameter(2, "x").unwrap();

        let err = sqlite_query(&statement).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::DataAccess);
        let err = mysql_query(&statement).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::DataAccess);
    }

    #[test]
    fn test_contiguous_positions_build() {
        let statement = Statement::new("INSERT INTO t(a, b, c) VALUES(?, ?, ?)")
            .unwrap()
            .with_parameter(1, 1)
            .unwrap()
            .with_parameter(2, Value::Null)
            .unwrap()
            .with_parameter(3, vec![0u8, 1, 2])
            .unwrap();

        assert!(sqlite_query(&statement).is_ok());
        assert!(mysql_query(&statement).is_ok());
    }
}
