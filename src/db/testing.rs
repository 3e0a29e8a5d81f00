//! In-memory fake driver for unit tests.
//!
//! `FakeDatabase` records every call made through its connections so tests can
//! assert on ordering, commit/rollback behavior and connection release without
//! a real database.
//!
//! Write statements: one generated key per `(?` value tuple of an `INSERT`,
//! `rows_affected` equal to the tuple count (1 for other writes). Any statement
//! whose text contains `FAIL` errors. Reads pop scripted result sets.

use crate::db::connection::{Connection, ConnectionProvider, ResultSet, UpdateOutcome};
use crate::error::{PersistError, PersistResult};
use crate::models::Statement;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct State {
    log: Vec<String>,
    committed: Vec<String>,
    result_sets: VecDeque<ResultSet>,
    next_key: i64,
    fail_rollback: bool,
    fail_acquire: bool,
    acquired: usize,
    released: usize,
    discarded: usize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeDatabase {
    state: Arc<Mutex<State>>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        let db = Self::default();
        db.lock().next_key = 1;
        db
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn connection(&self) -> FakeConnection {
        self.lock().acquired += 1;
        FakeConnection {
            state: self.state.clone(),
            auto_commit: true,
            pending: Vec::new(),
            discarded: false,
        }
    }

    pub fn fail_rollback(&self) {
        self.lock().fail_rollback = true;
    }

    pub fn fail_acquire(&self) {
        self.lock().fail_acquire = true;
    }

    pub fn push_result(&self, result_set: ResultSet) {
        self.lock().result_sets.push_back(result_set);
    }

    /// Texts of durably committed writes, in execution order.
    pub fn committed(&self) -> Vec<String> {
        self.lock().committed.clone()
    }

    pub fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    pub fn acquired(&self) -> usize {
        self.lock().acquired
    }

    pub fn released(&self) -> usize {
        self.lock().released
    }

    pub fn discarded(&self) -> usize {
        self.lock().discarded
    }
}

#[async_trait]
impl ConnectionProvider for FakeDatabase {
    async fn acquire(&self) -> PersistResult<Box<dyn Connection>> {
        if self.lock().fail_acquire {
            return Err(PersistError::data_access(
                "connection refused",
                None,
                "Check database server status",
            ));
        }
        Ok(Box::new(self.connection()))
    }
}

pub(crate) struct FakeConnection {
    state: Arc<Mutex<State>>,
    auto_commit: bool,
    pending: Vec<String>,
    discarded: bool,
}

impl FakeConnection {
    fn record(&self, entry: impl Into<String>) {
        self.state.lock().unwrap().log.push(entry.into());
    }

    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        self.state.lock().unwrap().committed.extend(pending);
    }
}

#[async_trait]
impl Connection for FakeConnection {
    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    async fn set_auto_commit(&mut self, enabled: bool) -> PersistResult<()> {
        self.record(format!("set_auto_commit({})", enabled));
        if enabled && !self.pending.is_empty() && self.discarded {
            return Err(PersistError::invalid_state(
                "Connection was discarded with an open transaction",
            ));
        }
        if enabled && !self.auto_commit {
            self.flush_pending();
        }
        self.auto_commit = enabled;
        Ok(())
    }

    async fn commit(&mut self) -> PersistResult<()> {
        self.record("commit");
        self.flush_pending();
        Ok(())
    }

    async fn rollback(&mut self) -> PersistResult<()> {
        self.record("rollback");
        if self.state.lock().unwrap().fail_rollback {
            return Err(PersistError::data_access(
                "rollback failed",
                None,
                "Check database server status",
            ));
        }
        self.pending.clear();
        Ok(())
    }

    async fn execute_update(&mut self, statement: &Statement) -> PersistResult<UpdateOutcome> {
        self.record(format!("execute:{}", statement.text()));
        statement.ordered_values()?;
        if statement.text().contains("FAIL") {
            return Err(PersistError::data_access(
                format!("near \"FAIL\": syntax error in {}", statement.text()),
                Some("1".to_string()),
                "Check the SQL syntax and referenced objects",
            ));
        }

        let tuples = statement.text().matches("(?").count().max(1) as u64;
        let mut outcome = UpdateOutcome {
            rows_affected: tuples,
            generated_keys: Vec::new(),
        };
        if statement.starts_with_keyword("INSERT") {
            let mut state = self.state.lock().unwrap();
            for _ in 0..tuples {
                outcome.generated_keys.push(state.next_key);
                state.next_key += 1;
            }
        }

        if self.auto_commit {
            self.state
                .lock()
                .unwrap()
                .committed
                .push(statement.text().to_string());
        } else {
            self.pending.push(statement.text().to_string());
        }
        Ok(outcome)
    }

    async fn execute_query(&mut self, statement: &Statement) -> PersistResult<ResultSet> {
        self.record(format!("query:{}", statement.text()));
        statement.ordered_values()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .result_sets
            .pop_front()
            .unwrap_or_default())
    }

    fn discard(&mut self) {
        self.record("discard");
        if !self.discarded {
            self.discarded = true;
            self.state.lock().unwrap().discarded += 1;
        }
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.released += 1;
        // An open transaction dies with the connection.
        self.pending.clear();
    }
}
