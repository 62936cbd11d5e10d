//! # Playlog Warehouse
//!
//! Warehouse access for playlog: a thin sqlx/Postgres layer plus the
//! resolution of the opaque connection and credential identifiers supplied
//! by the host environment.

pub mod client;
pub mod connections;
pub mod credentials;
pub mod postgres;

// Re-export commonly used types
pub use client::WarehouseClient;
pub use connections::{connection_env_var, resolve_connection};
pub use credentials::{resolve_credentials, StorageCredentials};
pub use postgres::{PoolConfig, Warehouse};

/// Result type for warehouse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for warehouse operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Statement-level failure reported by the database
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The warehouse could not be reached
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Unknown connection id: {0}")]
    UnknownConnection(String),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Error {
    /// Connectivity-class failures may be retried by the run driver; a
    /// statement failure would fail identically on retry and is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ConnectionFailed(_) => true,
            Error::Database(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failures_are_retryable() {
        assert!(Error::ConnectionFailed("refused".to_string()).is_retryable());
        assert!(Error::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(Error::Database(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset"
        )))
        .is_retryable());
    }

    #[test]
    fn test_statement_failures_are_terminal() {
        assert!(!Error::Database(sqlx::Error::Protocol("bad statement".to_string())).is_retryable());
        assert!(!Error::UnknownConnection("warehouse".to_string()).is_retryable());
        assert!(!Error::Credentials("missing".to_string()).is_retryable());
        assert!(!Error::ValidationError("bad pool".to_string()).is_retryable());
    }
}
