//! Single-statement execution.
//!
//! A `Query<E>` wraps one `Statement` and runs it on its own connection,
//! either as a read that materializes rows into `E` or as a write that
//! reports an `UpdateResult`:
//!
//! ```ignore
//! let queries = QueryManager::new(provider);
//! let mut query = queries.create_query::<Account>(
//!     Statement::new("SELECT id, name FROM account WHERE id = ?")?,
//! );
//! query.set_parameter(1, 7)?.execute().await?;
//! let account = query.single_result()?;
//! ```

use crate::db::connection::ConnectionProvider;
use crate::db::result::map_result_set;
use crate::error::{PersistError, PersistResult};
use crate::models::{Entity, Row, Statement, Value, materialize, materialize_all};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Outcome of a single write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub rows_affected: u64,
    /// First key the driver generated, if any.
    pub generated_key: Option<i64>,
}

impl UpdateResult {
    /// The generated key when one is positive, the affected row count
    /// otherwise.
    pub fn key_or_count(&self) -> i64 {
        match self.generated_key {
            Some(key) if key > 0 => key,
            _ => i64::try_from(self.rows_affected).unwrap_or(i64::MAX),
        }
    }
}

/// Creates queries bound to one connection provider.
#[derive(Clone)]
pub struct QueryManager {
    provider: Arc<dyn ConnectionProvider>,
}

impl QueryManager {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    /// A query whose rows materialize into `E`.
    pub fn create_query<E: Entity>(&self, statement: Statement) -> Query<E> {
        Query::new(self.provider.clone(), statement)
    }

    /// A query whose rows are returned as plain `Row`s.
    pub fn create_native_query(&self, statement: Statement) -> Query<Row> {
        Query::new(self.provider.clone(), statement)
    }
}

impl std::fmt::Debug for QueryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryManager").finish_non_exhaustive()
    }
}

pub struct Query<E> {
    provider: Arc<dyn ConnectionProvider>,
    statement: Statement,
    rows: Option<Vec<Row>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Query<E> {
    pub fn new(provider: Arc<dyn ConnectionProvider>, statement: Statement) -> Self {
        Self {
            provider,
            statement,
            rows: None,
            _entity: PhantomData,
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Bind `value` at 1-based position `index`, replacing any earlier value.
    pub fn set_parameter(
        &mut self,
        index: usize,
        value: impl Into<Value>,
    ) -> PersistResult<&mut Self> {
        self.statement.set_parameter(index, value)?;
        Ok(self)
    }

    pub fn with_parameter(mut self, index: usize, value: impl Into<Value>) -> PersistResult<Self> {
        self.statement.set_parameter(index, value)?;
        Ok(self)
    }

    /// Same as `execute_query`.
    pub async fn execute(&mut self) -> PersistResult<&mut Self> {
        self.execute_query().await
    }

    /// Run the statement as a read and keep its rows for `single_result`,
    /// `result_list` and `rows`.
    ///
    /// A read that matches nothing fails with `NoResult`.
    pub async fn execute_query(&mut self) -> PersistResult<&mut Self> {
        if !self.statement.is_read() {
            return Err(PersistError::invalid_statement_type(
                "execute_query() requires a SELECT statement",
            ));
        }
        self.rows = None;

        let start = Instant::now();
        debug!(
            sql = %self.statement.text(),
            params = self.statement.parameters().len(),
            "Executing query"
        );

        let result_set = {
            let mut conn = self.provider.acquire().await?;
            conn.execute_query(&self.statement).await?
        };
        let rows = map_result_set(result_set)?;

        debug!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query complete"
        );
        self.rows = Some(rows);
        Ok(self)
    }

    /// Run the statement as a write on a connection in autocommit mode.
    pub async fn execute_update(&mut self) -> PersistResult<UpdateResult> {
        if self.statement.is_read() {
            return Err(PersistError::invalid_statement_type(
                "execute_update() cannot run a SELECT statement",
            ));
        }

        let start = Instant::now();
        debug!(
            sql = %self.statement.text(),
            params = self.statement.parameters().len(),
            "Executing write operation"
        );

        let outcome = {
            let mut conn = self.provider.acquire().await?;
            conn.execute_update(&self.statement).await?
        };

        let result = UpdateResult {
            rows_affected: outcome.rows_affected,
            generated_key: outcome.generated_keys.first().copied(),
        };
        debug!(
            rows_affected = result.rows_affected,
            generated_key = ?result.generated_key,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Write complete"
        );
        Ok(result)
    }

    /// The one row of the last read, materialized.
    pub fn single_result(&self) -> PersistResult<E> {
        let rows = self.executed_rows()?;
        match rows {
            [row] => materialize(row),
            [] => Err(PersistError::no_result("The query did not return any results")),
            _ => Err(PersistError::non_unique_result(format!(
                "Expected one row, the query returned {}",
                rows.len()
            ))),
        }
    }

    /// Every row of the last read, materialized in order.
    pub fn result_list(&self) -> PersistResult<Vec<E>> {
        materialize_all(self.executed_rows()?)
    }

    /// The mapped rows of the last read.
    pub fn rows(&self) -> PersistResult<&[Row]> {
        self.executed_rows()
    }

    fn executed_rows(&self) -> PersistResult<&[Row]> {
        self.rows
            .as_deref()
            .ok_or_else(|| PersistError::invalid_state("Query has not been executed"))
    }
}

impl<E> std::fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("statement", &self.statement)
            .field("rows", &self.rows.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}
