//! Batched write transactions.
//!
//! A `TransactionManager` collects write statements between `begin()` and
//! `commit()`. Nothing touches the database until `commit()`, which runs the
//! whole queue on one connection inside one transaction:
//!
//! ```ignore
//! let mut manager = TransactionManager::new(provider);
//! manager.begin()?;
//! manager.persist(
//!     Statement::new("INSERT INTO account(name) VALUES(?)")?.with_parameter(1, "CASH")?,
//! )?;
//! manager.commit().await?;
//! let ids = manager.generated_ids();
//! ```
//!
//! `row_count()` after a commit is the update count of the **last** statement
//! in the batch, not a total.

use crate::db::connection::{Connection, ConnectionProvider};
use crate::db::guard::{AutoCommitGuard, RollbackGuard};
use crate::error::{PersistError, PersistResult};
use crate::models::Statement;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle state of a `TransactionManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    NotActive,
    Active,
}

/// Snapshot of a manager for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionInfo {
    /// Identifier of the current or most recent transaction
    pub transaction_id: Option<String>,
    pub state: TransactionState,
    pub began_at: Option<DateTime<Utc>>,
    /// Statements waiting in the queue
    pub queued: usize,
    pub generated_ids: Vec<i64>,
    pub row_count: u64,
}

pub struct TransactionManager {
    provider: Arc<dyn ConnectionProvider>,
    state: TransactionState,
    statements: Vec<Statement>,
    generated_ids: Vec<i64>,
    row_count: u64,
    transaction_id: Option<String>,
    began_at: Option<DateTime<Utc>>,
}

impl TransactionManager {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            state: TransactionState::NotActive,
            statements: Vec::new(),
            generated_ids: Vec::new(),
            row_count: 0,
            transaction_id: None,
            began_at: None,
        }
    }

    /// Start accumulating statements.
    ///
    /// Clears the generated ids and row count of the previous commit.
    /// Statements retained by a failed commit stay queued and run again on
    /// the next `commit()`; call `clear()` first to drop them.
    pub fn begin(&mut self) -> PersistResult<()> {
        if self.is_active() {
            return Err(PersistError::invalid_state("Transaction already active."));
        }
        let transaction_id = generate_transaction_id();
        self.generated_ids.clear();
        self.row_count = 0;
        self.began_at = Some(Utc::now());
        self.state = TransactionState::Active;

        debug!(
            transaction_id = %transaction_id,
            retained = self.statements.len(),
            "Transaction started"
        );
        self.transaction_id = Some(transaction_id);
        Ok(())
    }

    /// Queue a write statement. Nothing is executed until `commit()`.
    pub fn persist(&mut self, statement: Statement) -> PersistResult<()> {
        if !self.is_active() {
            return Err(PersistError::invalid_state("No active transaction."));
        }
        if statement.is_read() {
            return Err(PersistError::invalid_statement_type(
                "SELECT statements cannot be persisted in a transaction",
            ));
        }
        self.statements.push(statement);
        Ok(())
    }

    /// Execute every queued statement, in order, as one transaction.
    ///
    /// On success the queue is emptied. On failure the work is rolled back,
    /// the error is returned as a data access error, and the queue is kept
    /// for inspection. Either way the manager ends up not active and the
    /// connection has been released.
    pub async fn commit(&mut self) -> PersistResult<()> {
        if !self.is_active() {
            return Err(PersistError::invalid_state("No active transaction."));
        }
        if self.statements.is_empty() {
            return Err(PersistError::invalid_state("Nothing to commit."));
        }

        let transaction_id = self.transaction_id.clone().unwrap_or_default();
        debug!(
            transaction_id = %transaction_id,
            statements = self.statements.len(),
            "Committing transaction"
        );

        let result = self.execute_batch().await;
        self.state = TransactionState::NotActive;

        match result {
            Ok(()) => {
                self.statements.clear();
                info!(
                    transaction_id = %transaction_id,
                    generated_ids = self.generated_ids.len(),
                    row_count = self.row_count,
                    "Transaction committed"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    transaction_id = %transaction_id,
                    error = %e,
                    "Transaction rolled back"
                );
                Err(e)
            }
        }
    }

    /// Abandon the active transaction. Queued statements are dropped; the
    /// database was never touched.
    pub fn rollback(&mut self) -> PersistResult<()> {
        if !self.is_active() {
            return Err(PersistError::invalid_state("No active transaction."));
        }
        info!(
            transaction_id = ?self.transaction_id,
            discarded = self.statements.len(),
            "Transaction abandoned"
        );
        self.statements.clear();
        self.state = TransactionState::NotActive;
        Ok(())
    }

    /// Drop statements retained by a failed commit.
    pub fn clear(&mut self) -> PersistResult<()> {
        if self.is_active() {
            return Err(PersistError::invalid_state(
                "Transaction is active; use rollback() to abandon it",
            ));
        }
        self.statements.clear();
        Ok(())
    }

    /// Keys generated by the last commit, in statement order.
    pub fn generated_ids(&self) -> &[i64] {
        &self.generated_ids
    }

    /// Update count of the last statement executed by the last commit.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn queued_statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn info(&self) -> TransactionInfo {
        TransactionInfo {
            transaction_id: self.transaction_id.clone(),
            state: self.state,
            began_at: self.began_at,
            queued: self.statements.len(),
            generated_ids: self.generated_ids.clone(),
            row_count: self.row_count,
        }
    }

    async fn execute_batch(&mut self) -> PersistResult<()> {
        let mut conn = self.provider.acquire().await?;
        let mut auto = AutoCommitGuard::acquire(conn.as_mut(), false).await?;
        let mut tx = RollbackGuard::new(&mut *auto);

        let result = match run_statements(
            &mut *tx,
            &self.statements,
            &mut self.generated_ids,
            &mut self.row_count,
        )
        .await
        {
            Ok(()) => tx.commit().await,
            Err(e) => Err(e),
        };

        // A failed rollback is logged; the primary error is what the caller sees.
        // Restoring autocommit would commit whatever the rollback left open, so
        // the guard is dropped instead and the connection discarded.
        match tx.close().await {
            Ok(()) => {
                if let Err(restore_err) = auto.restore().await {
                    warn!(error = %restore_err, "Failed to restore autocommit mode");
                }
            }
            Err(rollback_err) => {
                warn!(error = %rollback_err, "Rollback failed");
                drop(auto);
            }
        }
        result
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("transaction_id", &self.transaction_id)
            .field("state", &self.state)
            .field("queued", &self.statements.len())
            .field("generated_ids", &self.generated_ids)
            .field("row_count", &self.row_count)
            .finish()
    }
}

async fn run_statements(
    conn: &mut dyn Connection,
    statements: &[Statement],
    generated_ids: &mut Vec<i64>,
    row_count: &mut u64,
) -> PersistResult<()> {
    for statement in statements {
        debug!(
            sql = %statement.text(),
            params = statement.parameters().len(),
            "Executing in transaction"
        );
        let outcome = conn.execute_update(statement).await?;
        *row_count = outcome.rows_affected;
        generated_ids.extend(outcome.generated_keys);
    }
    Ok(())
}

/// Generate a unique transaction ID.
fn generate_transaction_id() -> String {
    format!("tx_{}", uuid::Uuid::new_v4().simple())
}
