//! Database layer.
//!
//! This module provides:
//! - The driver interface (`ConnectionProvider`, `Connection`)
//! - Connection-scoped autocommit and rollback guards
//! - Batched write transactions
//! - Single-statement queries and result-set mapping
//! - An sqlx-backed provider for MySQL and SQLite

pub mod connection;
pub mod executor;
pub mod guard;
pub mod macros;
pub mod params;
pub mod pool;
pub mod result;
pub mod transaction;
pub mod types;

#[cfg(test)]
mod testing;

pub use connection::{Connection, ConnectionProvider, ResultSet, UpdateOutcome};
pub use executor::{Query, QueryManager, UpdateResult};
pub use guard::{AutoCommitGuard, RollbackGuard};
pub use pool::{DataSource, DbPool, PooledConnection};
pub use result::map_result_set;
pub use transaction::{TransactionInfo, TransactionManager, TransactionState};
