//! Entity materialization.
//!
//! Caller types opt into row conversion by implementing `Entity`. The
//! conversion is resolved at compile time, so the only failure left is the
//! conversion itself, which `materialize` folds into a data access error.

use crate::error::{PersistError, PersistResult};
use crate::models::{Row, RowError};

/// A caller-defined type that can be built from one mapped `Row`.
///
/// Column names in the row are upper-cased; `Row::try_get` upper-cases the
/// requested name as well, so either case works.
///
/// ```ignore
/// struct Account {
///     id: i64,
///     name: String,
/// }
///
/// impl Entity for Account {
///     fn from_row(row: &Row) -> Result<Self, RowError> {
///         Ok(Self {
///             id: row.try_get("id")?,
///             name: row.try_get("name")?,
///         })
///     }
/// }
/// ```
pub trait Entity: Sized {
    fn from_row(row: &Row) -> Result<Self, RowError>;
}

/// Rows are their own entity, for callers that want the raw mapping.
impl Entity for Row {
    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(row.clone())
    }
}

/// Convert one row into `E`.
pub fn materialize<E: Entity>(row: &Row) -> PersistResult<E> {
    E::from_row(row).map_err(|e| PersistError::materialization(entity_name::<E>(), e))
}

/// Convert every row into `E`, preserving order. Stops at the first failure.
pub fn materialize_all<E: Entity>(rows: &[Row]) -> PersistResult<Vec<E>> {
    rows.iter().map(materialize::<E>).collect()
}

fn entity_name<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::Value;

    #[derive(Debug, PartialEq)]
    struct Account {
        id: i64,
        name: String,
    }

    impl Entity for Account {
        fn from_row(row: &Row) -> Result<Self, RowError> {
            Ok(Self {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })
        }
    }

    #[test]
    fn test_materialize_applies_from_row() {
        let row: Row = [("ID", Value::Int(1)), ("NAME", Value::from("CASH"))]
            .into_iter()
            .collect();
        let account: Account = materialize(&row).unwrap();
        assert_eq!(
            account,
            Account {
                id: 1,
                name: "CASH".to_string()
            }
        );
    }

    #[test]
    fn test_conversion_failure_is_data_access() {
        let row: Row = [("ID", Value::Int(1))].into_iter().collect();
        let err = materialize::<Account>(&row).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataAccess);
        assert!(err.to_string().contains("Account"));
        assert!(err.to_string().contains("NAME"));
    }

    #[test]
    fn test_row_is_identity_entity() {
        let row: Row = [("X", Value::Int(5))].into_iter().collect();
        let rows = materialize_all::<Row>(std::slice::from_ref(&row)).unwrap();
        assert_eq!(rows, vec![row]);
    }
}
