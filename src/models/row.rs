//! Mapped result rows.
//!
//! A `Row` holds one result-set record as an ordered list of
//! `(UPPER(column), value)` pairs. Column lookups upper-case the requested
//! name first, so access is case-insensitive for every consumer.

use crate::models::Value;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while reading typed values out of a `Row`.
///
/// These stay inside `Entity::from_row`; the materializer wraps them into a
/// data access error before they reach the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("column {0} is not present in the row")]
    MissingColumn(String),

    #[error("column {column} holds {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Insert a column, upper-casing its name. A repeated name replaces the
    /// earlier value in place.
    pub fn insert(&mut self, name: &str, value: Value) {
        let key = name.to_uppercase();
        match self.columns.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((key, value)),
        }
    }

    /// Look up a column value by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let key = name.to_uppercase();
        self.columns
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Read a typed value, failing if the column is absent or of another type.
    pub fn try_get<T: FromValue>(&self, name: &str) -> Result<T, RowError> {
        let value = self
            .get(name)
            .ok_or_else(|| RowError::MissingColumn(name.to_uppercase()))?;
        T::from_value(value).ok_or_else(|| RowError::TypeMismatch {
            column: name.to_uppercase(),
            expected: T::EXPECTED,
            found: value.type_name(),
        })
    }

    /// Upper-cased column names in result-set order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Render the row as a JSON object, keys in column order as far as
    /// `serde_json::Map` preserves it.
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.columns
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect()
    }
}

impl<S: AsRef<str>> FromIterator<(S, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(name.as_ref(), value);
        }
        row
    }
}

/// Typed extraction from a `Value`.
pub trait FromValue: Sized {
    /// Name of the expected type, used in mismatch errors.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for i32 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for Vec<u8> {
    const EXPECTED: &'static str = "bytes";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_row() -> Row {
        [
            ("id", Value::Int(7)),
            ("Name", Value::from("CASH")),
            ("closed", Value::Null),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_keys_are_upper_cased_in_order() {
        let row = account_row();
        let names: Vec<&str> = row.column_names().collect();
        assert_eq!(names, vec!["ID", "NAME", "CLOSED"]);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let row = account_row();
        assert_eq!(row.get("name"), Some(&Value::from("CASH")));
        assert_eq!(row.get("NAME"), row.get("nAmE"));
        assert!(!row.contains("balance"));
    }

    #[test]
    fn test_try_get_typed() {
        let row = account_row();
        assert_eq!(row.try_get::<i64>("id"), Ok(7));
        assert_eq!(row.try_get::<String>("name"), Ok("CASH".to_string()));
        assert_eq!(row.try_get::<Option<String>>("closed"), Ok(None));
    }

    #[test]
    fn test_try_get_errors() {
        let row = account_row();
        assert_eq!(
            row.try_get::<i64>("balance"),
            Err(RowError::MissingColumn("BALANCE".to_string()))
        );
        assert_eq!(
            row.try_get::<i64>("name"),
            Err(RowError::TypeMismatch {
                column: "NAME".to_string(),
                expected: "int",
                found: "text",
            })
        );
    }

    #[test]
    fn test_duplicate_column_replaces_value() {
        let mut row = Row::new();
        row.insert("id", Value::Int(1));
        row.insert("ID", Value::Int(2));
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("id"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_to_json_map() {
        let map = account_row().to_json_map();
        assert_eq!(map["ID"], serde_json::json!(7));
        assert_eq!(map["CLOSED"], serde_json::Value::Null);
    }
}
