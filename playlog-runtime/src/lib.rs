//! # Playlog Runtime
//!
//! Run driver for playlog pipelines: operator execution, retry policy and
//! graph-ordered task scheduling with failure propagation.

pub mod operators;
pub mod retry;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use retry::RetryPolicy;
pub use runner::{PipelineRunner, RunState, RunSummary, TaskRun, TaskState};

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for runtime operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Warehouse error: {0}")]
    Warehouse(#[from] playlog_warehouse::Error),

    #[error(
        "Quality check failed: assertion {index} `{check_sql}` returned {actual:?}, expected {expected}"
    )]
    QualityCheck {
        index: usize,
        check_sql: String,
        expected: i64,
        actual: Option<i64>,
    },

    #[error("Graph error: {0}")]
    Graph(#[from] playlog_core::GraphError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Only connectivity-class warehouse failures are retryable; statement
    /// and quality failures would fail identically on another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Warehouse(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_failures_are_terminal() {
        let err = Error::QualityCheck {
            index: 0,
            check_sql: "SELECT COUNT(*) FROM public.songs WHERE title IS NULL".to_string(),
            expected: 0,
            actual: Some(2),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("assertion 0"));
    }

    #[test]
    fn test_connectivity_failures_are_retryable() {
        let err = Error::Warehouse(playlog_warehouse::Error::ConnectionFailed(
            "refused".to_string(),
        ));
        assert!(err.is_retryable());
    }
}
