//! Test fixtures: a scripted connection standing in for a real driver.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use relata_orm::{Connection, ExecuteResult, OrmError, OrmResult, Row};

/// Connection double that replays queued responses in statement order and
/// records every statement it receives. With an empty queue it answers
/// with an empty successful result.
#[derive(Default)]
pub struct MockConnection {
    responses: Mutex<VecDeque<OrmResult<ExecuteResult>>>,
    log: Mutex<Vec<(String, Vec<Value>)>>,
    transactional: bool,
}

impl MockConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A mock that reports transaction support
    pub fn transactional() -> Arc<Self> {
        Arc::new(Self {
            transactional: true,
            ..Self::default()
        })
    }

    /// Queue an empty success for a statement whose result is irrelevant
    pub fn respond_ok(&self) {
        self.push(Ok(ExecuteResult::default()));
    }

    pub fn respond_rows(&self, rows: Vec<Row>) {
        let rows_affected = rows.len() as u64;
        self.push(Ok(ExecuteResult {
            rows,
            rows_affected,
            last_insert_id: None,
        }));
    }

    pub fn respond_affected(&self, rows_affected: u64) {
        self.push(Ok(ExecuteResult {
            rows: Vec::new(),
            rows_affected,
            last_insert_id: None,
        }));
    }

    pub fn respond(&self, result: ExecuteResult) {
        self.push(Ok(result));
    }

    /// Queue a driver failure
    pub fn fail(&self, message: &str) {
        self.push(Err(OrmError::Database(message.to_string())));
    }

    fn push(&self, result: OrmResult<ExecuteResult>) {
        self.responses.lock().unwrap().push_back(result);
    }

    /// Every statement text received, in order
    pub fn statements(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// Every (statement, params) call received, in order
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.log.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecuteResult> {
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ExecuteResult::default()))
    }

    fn supports_transactions(&self) -> bool {
        self.transactional
    }

    async fn begin(&self) -> OrmResult<()> {
        self.log.lock().unwrap().push(("BEGIN".to_string(), Vec::new()));
        Ok(())
    }

    async fn commit(&self) -> OrmResult<()> {
        self.log.lock().unwrap().push(("COMMIT".to_string(), Vec::new()));
        Ok(())
    }

    async fn rollback(&self) -> OrmResult<()> {
        self.log
            .lock()
            .unwrap()
            .push(("ROLLBACK".to_string(), Vec::new()));
        Ok(())
    }
}

/// Build a result row from column/value pairs
pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
