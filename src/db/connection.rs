//! Driver interface.
//!
//! The transaction manager and query executor only ever talk to a database
//! through these two traits. `DataSource` in `pool.rs` implements them on top
//! of sqlx pools; tests implement them with in-memory fakes.

use crate::error::PersistResult;
use crate::models::{Statement, Value};
use async_trait::async_trait;

/// Rows affected and keys generated by one write execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub rows_affected: u64,
    /// Generated keys in the order the driver reported them.
    pub generated_keys: Vec<i64>,
}

/// A drained driver result set: column names as the driver reports them and
/// one value per column for each record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub records: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Hands out connections. Releasing a connection is dropping it.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn acquire(&self) -> PersistResult<Box<dyn Connection>>;
}

/// One exclusively owned database connection.
#[async_trait]
pub trait Connection: Send {
    /// Current autocommit mode.
    fn auto_commit(&self) -> bool;

    /// Switch autocommit mode. Turning autocommit back on while a transaction
    /// is open commits it.
    async fn set_auto_commit(&mut self, enabled: bool) -> PersistResult<()>;

    /// Commit the open transaction, if any.
    async fn commit(&mut self) -> PersistResult<()>;

    /// Roll back the open transaction, if any.
    async fn rollback(&mut self) -> PersistResult<()>;

    /// Prepare, bind and execute a write statement, asking the driver for
    /// generated keys.
    async fn execute_update(&mut self, statement: &Statement) -> PersistResult<UpdateOutcome>;

    /// Prepare, bind and execute a read statement, draining every record.
    async fn execute_query(&mut self, statement: &Statement) -> PersistResult<ResultSet>;

    /// Mark the connection as unusable so that dropping it closes it instead
    /// of returning it for reuse. Called from guard `Drop` impls, which cannot
    /// await a rollback or an autocommit reset.
    fn discard(&mut self);
}
