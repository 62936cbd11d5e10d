//! Pipeline task definitions
//!
//! A task is one node in the pipeline graph: either a marker delimiting the
//! run, or an operator issuing a single SQL statement against the warehouse.
//! Behavior never varies within a kind, so each kind carries its own explicit
//! configuration struct instead of an inheritance hierarchy.

use serde::{Deserialize, Serialize};

/// Identifier of a task within a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a task id from a name
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// JSON field-layout specification for a bulk copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonFormat {
    /// Infer the field layout from the objects themselves
    Auto,

    /// Path-mapping file describing the field layout
    PathFile {
        /// Object-storage location of the mapping file
        path: String,
    },
}

/// Configuration for a staging copy: raw JSON objects from object storage
/// into a staging table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Target staging table
    pub table: String,

    /// Source path of the form `<bucket>/<prefix>`
    pub source_path: String,

    /// JSON field-layout specification
    pub format: JsonFormat,

    /// Opaque warehouse connection identifier, resolved by the host environment
    pub connection_id: String,

    /// Opaque object-storage credential identifier, resolved by the host
    /// environment; the key pair never appears in the task definition
    pub credentials_id: String,
}

/// Configuration for the fact-table load.
///
/// The load is a single append-only INSERT. Re-running it duplicates fact
/// rows unless the configured SELECT is itself idempotent; deduplication is
/// the caller's concern, not this operator's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadFactConfig {
    /// Target fact table
    pub table: String,

    /// SELECT body sourcing rows from the staging tables
    pub select_sql: String,

    /// Opaque warehouse connection identifier
    pub connection_id: String,
}

/// Configuration for a dimension-table load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDimensionConfig {
    /// Target dimension table
    pub table: String,

    /// SELECT body sourcing rows from the staging tables
    pub select_sql: String,

    /// Empty the table before inserting. The TRUNCATE and INSERT are issued
    /// as separate statements; a failure between them leaves the table empty
    /// until the next successful run.
    pub truncate: bool,

    /// Opaque warehouse connection identifier
    pub connection_id: String,
}

/// A single data-quality assertion: a query whose first returned scalar must
/// equal the expected value exactly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssertion {
    /// Query text; a `{schema}` placeholder is rendered before execution
    pub check_sql: String,

    /// Expected scalar result
    pub expected: i64,
}

impl QualityAssertion {
    /// Create an assertion
    pub fn new(check_sql: impl Into<String>, expected: i64) -> Self {
        Self {
            check_sql: check_sql.into(),
            expected,
        }
    }

    /// Render the query against a schema name
    pub fn render(&self, schema: &str) -> String {
        self.check_sql.replace("{schema}", schema)
    }
}

/// Configuration for the quality-check step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheckConfig {
    /// Tables covered by this check, recorded for logging only
    pub tables: Vec<String>,

    /// Schema the assertions run against
    pub schema: String,

    /// Assertions, evaluated in declaration order
    pub assertions: Vec<QualityAssertion>,

    /// Opaque warehouse connection identifier
    pub connection_id: String,
}

/// The closed set of pipeline task kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskKind {
    /// Marker delimiting the start of a run; performs no work
    Start,

    /// Marker delimiting the end of a run; performs no work
    End,

    /// Copy raw JSON from object storage into a staging table
    StageToWarehouse(StageConfig),

    /// Append transformed rows into the fact table
    LoadFact(LoadFactConfig),

    /// Load a dimension table, optionally truncating it first
    LoadDimension(LoadDimensionConfig),

    /// Run assertion queries against the loaded tables
    QualityCheck(QualityCheckConfig),
}

impl TaskKind {
    /// Kind name for logging
    pub fn kind_name(&self) -> &'static str {
        match self {
            TaskKind::Start => "start",
            TaskKind::End => "end",
            TaskKind::StageToWarehouse(_) => "stage_to_warehouse",
            TaskKind::LoadFact(_) => "load_fact",
            TaskKind::LoadDimension(_) => "load_dimension",
            TaskKind::QualityCheck(_) => "quality_check",
        }
    }

    /// True for the start/end markers
    pub fn is_marker(&self) -> bool {
        matches!(self, TaskKind::Start | TaskKind::End)
    }
}

/// A named node in the pipeline graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier, unique within the pipeline
    pub id: TaskId,

    /// What the task does when executed
    pub kind: TaskKind,
}

impl Task {
    /// Create a task
    pub fn new(id: impl Into<TaskId>, kind: TaskKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Marker task delimiting the start of a run
    pub fn start(id: impl Into<TaskId>) -> Self {
        Self::new(id, TaskKind::Start)
    }

    /// Marker task delimiting the end of a run
    pub fn end(id: impl Into<TaskId>) -> Self {
        Self::new(id, TaskKind::End)
    }
}
