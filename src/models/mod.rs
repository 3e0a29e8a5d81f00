//! Data models for sql-persist.
//!
//! This module re-exports the statement, value, row and entity types used
//! throughout the crate.

pub mod entity;
pub mod row;
pub mod statement;
pub mod value;

// Re-export commonly used types
pub use entity::{Entity, materialize, materialize_all};
pub use row::{FromValue, Row, RowError};
pub use statement::{Statement, StatementKind};
pub use value::Value;
