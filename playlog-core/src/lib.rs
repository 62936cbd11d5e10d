//! # Playlog Core
//!
//! Pipeline definitions for the playlog warehouse: task and graph types,
//! schedules, and the SQL template library backing the operators.

pub mod graph;
pub mod pipelines;
pub mod schedule;
pub mod sql;
pub mod task;

// Re-export commonly used types
pub use graph::{ExecutionPlan, GraphError, Pipeline, PipelineBuilder};
pub use pipelines::{songplays, SongplaysSettings};
pub use schedule::{Schedule, ScheduleError};
pub use task::{
    JsonFormat, LoadDimensionConfig, LoadFactConfig, QualityAssertion, QualityCheckConfig,
    StageConfig, Task, TaskId, TaskKind,
};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),
}
