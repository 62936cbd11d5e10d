//! Scripted warehouse client for operator and driver tests

use async_trait::async_trait;
use playlog_warehouse::{Error as WarehouseError, Result as WarehouseResult, WarehouseClient};
use std::sync::Mutex;

/// In-memory [`WarehouseClient`] that records every statement and fails or
/// answers according to substring rules.
#[derive(Default)]
pub(crate) struct ScriptedWarehouse {
    executed: Mutex<Vec<String>>,
    statement_failures: Vec<String>,
    connectivity_failures: Mutex<Vec<(String, u32)>>,
    scalars: Vec<(String, Option<i64>)>,
}

impl ScriptedWarehouse {
    /// Statements containing `needle` fail with a statement-class error
    pub(crate) fn fail_statement(mut self, needle: &str) -> Self {
        self.statement_failures.push(needle.to_string());
        self
    }

    /// The next `times` statements containing `needle` fail with a
    /// connectivity-class error
    pub(crate) fn fail_connectivity(self, needle: &str, times: u32) -> Self {
        self.connectivity_failures
            .lock()
            .unwrap()
            .push((needle.to_string(), times));
        self
    }

    /// Queries containing `needle` return `value`; unmatched queries
    /// return `Some(0)`
    pub(crate) fn scalar(mut self, needle: &str, value: Option<i64>) -> Self {
        self.scalars.push((needle.to_string(), value));
        self
    }

    /// Every statement seen so far, in order
    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    fn check_failures(&self, sql: &str) -> WarehouseResult<()> {
        {
            let mut rules = self.connectivity_failures.lock().unwrap();
            if let Some(rule) = rules
                .iter_mut()
                .find(|(needle, times)| *times > 0 && sql.contains(needle.as_str()))
            {
                rule.1 -= 1;
                return Err(WarehouseError::ConnectionFailed(
                    "connection reset by warehouse".to_string(),
                ));
            }
        }

        if let Some(needle) = self
            .statement_failures
            .iter()
            .find(|n| sql.contains(n.as_str()))
        {
            return Err(WarehouseError::Database(sqlx::Error::Protocol(format!(
                "statement rejected ({needle})"
            ))));
        }

        Ok(())
    }
}

#[async_trait]
impl WarehouseClient for ScriptedWarehouse {
    async fn execute(&self, sql: &str) -> WarehouseResult<u64> {
        self.executed.lock().unwrap().push(sql.to_string());
        self.check_failures(sql)?;
        Ok(1)
    }

    async fn fetch_scalar(&self, sql: &str) -> WarehouseResult<Option<i64>> {
        self.executed.lock().unwrap().push(sql.to_string());
        self.check_failures(sql)?;

        for (needle, value) in &self.scalars {
            if sql.contains(needle.as_str()) {
                return Ok(*value);
            }
        }
        Ok(Some(0))
    }
}
