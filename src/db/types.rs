//! Column decoding.
//!
//! Converts driver rows into `Value`s in two phases:
//! 1. `categorize_type` classifies the column type name into a `TypeCategory`
//! 2. a database-specific decoder extracts the value for that category
//!
//! MySQL columns are classified by their declared type. SQLite is dynamically
//! typed, so its values are classified by the storage class of each value.

use crate::config::DatabaseType;
use crate::error::{PersistError, PersistResult};
use crate::models::Value;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Temporal,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Checked before "numeric" can fall into the float branch
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC affinity stores plain numbers
        if db == DatabaseType::SQLite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("int") || lower.contains("serial") || lower == "year" {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    if lower.contains("blob") || lower.contains("binary") {
        return TypeCategory::Binary;
    }

    if lower.contains("date") || lower.contains("time") {
        return TypeCategory::Temporal;
    }

    if lower.contains("char") || lower.contains("text") || lower == "enum" || lower == "set" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

/// Wrapper type for raw DECIMAL values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// Column names of a MySQL row, as the driver reports them.
pub(crate) fn mysql_column_names(row: &MySqlRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Column names of a SQLite row, as the driver reports them.
pub(crate) fn sqlite_column_names(row: &SqliteRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Decode every column of a MySQL row.
pub(crate) fn decode_mysql_row(row: &MySqlRow) -> PersistResult<Vec<Value>> {
    row.columns()
        .iter()
        .map(|col| mysql::decode_column(row, col.ordinal(), col.type_info().name()))
        .collect()
}

/// Decode every column of a SQLite row.
pub(crate) fn decode_sqlite_row(row: &SqliteRow) -> PersistResult<Vec<Value>> {
    (0..row.columns().len())
        .map(|idx| sqlite::decode_column(row, idx))
        .collect()
}

fn unsupported(type_name: &str, idx: usize) -> PersistError {
    PersistError::data_access(
        format!("Unsupported type {} in column {}", type_name, idx),
        None,
        "Cast the column to a text or numeric type in the SELECT list",
    )
}

mod mysql {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    pub fn decode_column(row: &MySqlRow, idx: usize, type_name: &str) -> PersistResult<Value> {
        if row.try_get_raw(idx)?.is_null() {
            return Ok(Value::Null);
        }
        match categorize_type(type_name, DatabaseType::MySQL) {
            TypeCategory::Boolean => Ok(Value::Bool(row.try_get::<bool, _>(idx)?)),
            TypeCategory::Integer => decode_integer(row, idx, type_name),
            TypeCategory::Float => decode_float(row, idx, type_name),
            TypeCategory::Decimal => Ok(Value::Text(row.try_get::<RawDecimal, _>(idx)?.0)),
            TypeCategory::Binary => Ok(Value::Bytes(row.try_get::<Vec<u8>, _>(idx)?)),
            TypeCategory::Json => Ok(Value::Text(
                row.try_get::<serde_json::Value, _>(idx)?.to_string(),
            )),
            TypeCategory::Temporal => decode_temporal(row, idx, type_name),
            TypeCategory::Text | TypeCategory::Unknown => decode_text(row, idx, type_name),
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize, type_name: &str) -> PersistResult<Value> {
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return Ok(Value::Int(v));
        }
        // Unsigned columns only decode as unsigned Rust types
        match row.try_get::<u64, _>(idx) {
            Ok(v) => Ok(i64::try_from(v)
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Text(v.to_string()))),
            Err(_) => Err(unsupported(type_name, idx)),
        }
    }

    fn decode_float(row: &MySqlRow, idx: usize, type_name: &str) -> PersistResult<Value> {
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return Ok(Value::Float(v));
        }
        if let Ok(v) = row.try_get::<f32, _>(idx) {
            return Ok(Value::Float(f64::from(v)));
        }
        Err(unsupported(type_name, idx))
    }

    fn decode_temporal(row: &MySqlRow, idx: usize, type_name: &str) -> PersistResult<Value> {
        if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
            return Ok(Value::Text(v.to_string()));
        }
        if let Ok(v) = row.try_get::<DateTime<Utc>, _>(idx) {
            return Ok(Value::Text(v.naive_utc().to_string()));
        }
        if let Ok(v) = row.try_get::<NaiveDate, _>(idx) {
            return Ok(Value::Text(v.to_string()));
        }
        if let Ok(v) = row.try_get::<NaiveTime, _>(idx) {
            return Ok(Value::Text(v.to_string()));
        }
        decode_text(row, idx, type_name)
    }

    fn decode_text(row: &MySqlRow, idx: usize, type_name: &str) -> PersistResult<Value> {
        if let Ok(v) = row.try_get::<String, _>(idx) {
            return Ok(Value::Text(v));
        }
        match row.try_get_unchecked::<Vec<u8>, _>(idx) {
            Ok(bytes) => Ok(String::from_utf8(bytes)
                .map(Value::Text)
                .unwrap_or_else(|e| Value::Bytes(e.into_bytes()))),
            Err(_) => Err(unsupported(type_name, idx)),
        }
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(row: &SqliteRow, idx: usize) -> PersistResult<Value> {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let storage = raw.type_info().name().to_string();

        match categorize_type(&storage, DatabaseType::SQLite) {
            TypeCategory::Integer => Ok(Value::Int(row.try_get::<i64, _>(idx)?)),
            TypeCategory::Boolean => Ok(Value::Bool(row.try_get::<bool, _>(idx)?)),
            TypeCategory::Float | TypeCategory::Decimal => {
                Ok(Value::Float(row.try_get::<f64, _>(idx)?))
            }
            TypeCategory::Binary => Ok(Value::Bytes(row.try_get::<Vec<u8>, _>(idx)?)),
            TypeCategory::Text
            | TypeCategory::Json
            | TypeCategory::Temporal
            | TypeCategory::Unknown => match row.try_get::<String, _>(idx) {
                Ok(v) => Ok(Value::Text(v)),
                Err(_) => Err(unsupported(&storage, idx)),
            },
        }
    }
}
