//! sql-persist
//!
//! A transactional SQL execution layer over sqlx. It batches parameterized
//! write statements into one atomic unit of work with ordered generated-key
//! collection, and runs parameterized reads that materialize rows into
//! caller-defined entity types.
//!
//! ```ignore
//! use sql_persist::{DataSource, DataSourceConfig, Statement, TransactionManager};
//! use std::sync::Arc;
//!
//! let config = DataSourceConfig::parse("sqlite:ledger.db")?;
//! let source = Arc::new(DataSource::connect(&config).await?);
//!
//! let mut tx = TransactionManager::new(source.clone());
//! tx.begin()?;
//! tx.persist(Statement::new("INSERT INTO account(name) VALUES(?)")?.with_parameter(1, "CASH")?)?;
//! tx.commit().await?;
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::{DataSourceConfig, DatabaseType, PoolOptions};
pub use db::{
    AutoCommitGuard, Connection, ConnectionProvider, DataSource, DbPool, Query, QueryManager,
    ResultSet, RollbackGuard, TransactionInfo, TransactionManager, TransactionState,
    UpdateOutcome, UpdateResult,
};
pub use error::{ErrorKind, PersistError, PersistResult};
pub use models::{
    Entity, FromValue, Row, RowError, Statement, StatementKind, Value, materialize,
    materialize_all,
};
