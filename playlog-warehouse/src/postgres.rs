//! PostgreSQL warehouse backend

use crate::client::WarehouseClient;
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;

/// Configuration for the connection pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 30,
        }
    }
}

/// Warehouse handle over a PostgreSQL connection pool.
///
/// Operators do not own a connection: each call checks one out of the pool
/// for the duration of its single statement and returns it before
/// completing, success or failure alike.
#[derive(Debug)]
pub struct Warehouse {
    pool: PgPool,
}

impl Warehouse {
    /// Connect with the default pool configuration
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::with_pool_config(database_url, PoolConfig::default()).await
    }

    /// Connect using an explicit pool configuration
    pub async fn with_pool_config(database_url: &str, config: PoolConfig) -> Result<Self> {
        if config.min_connections == 0 {
            return Err(Error::ValidationError(
                "min_connections must be > 0".to_string(),
            ));
        }
        if config.max_connections < config.min_connections {
            return Err(Error::ValidationError(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| Error::ConnectionFailed(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Row count of `schema.table`
    pub async fn row_count(&self, schema: &str, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {schema}.{table}");
        Ok(self.fetch_scalar(&sql).await?.unwrap_or(0))
    }
}

#[async_trait]
impl WarehouseClient for Warehouse {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let done = sqlx::query(sql).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    async fn fetch_scalar(&self, sql: &str) -> Result<Option<i64>> {
        let row = sqlx::query(sql).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(Some(row.try_get::<i64, _>(0)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_config() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout_secs, 30);
    }

    #[tokio::test]
    async fn test_zero_min_connections_rejected() {
        let config = PoolConfig {
            min_connections: 0,
            ..PoolConfig::default()
        };
        let err = Warehouse::with_pool_config("postgres://localhost/ignored", config)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_max_below_min_rejected() {
        let config = PoolConfig {
            max_connections: 1,
            min_connections: 2,
            ..PoolConfig::default()
        };
        let err = Warehouse::with_pool_config("postgres://localhost/ignored", config)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }
}
