//! Warehouse client seam
//!
//! The run driver talks to the warehouse through this trait so pipeline
//! behavior can be exercised against a scripted client in tests.

use crate::Result;
use async_trait::async_trait;

/// A connection to the warehouse capable of running plain SQL text
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Execute a statement, returning the number of rows affected
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Run a query and return the first column of the first row, if any
    async fn fetch_scalar(&self, sql: &str) -> Result<Option<i64>>;
}
