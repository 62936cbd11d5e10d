//! Pipeline run driver
//!
//! Executes a compiled pipeline sequentially in topological order. A task
//! starts only after every upstream dependency succeeded; when a task fails,
//! its transitive downstream tasks are skipped while unrelated branches
//! still run. The driver always produces a summary — task failures are
//! recorded, not propagated.

use crate::operators;
use crate::retry::RetryPolicy;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use playlog_core::graph::Pipeline;
use playlog_core::task::{Task, TaskId, TaskKind};
use playlog_warehouse::{resolve_credentials, StorageCredentials, WarehouseClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// State of a single task within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task has not started
    Pending,

    /// Task completed successfully
    Succeeded,

    /// Task failed after exhausting its attempts
    Failed,

    /// Task was not executed because an upstream task did not succeed
    Skipped,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Succeeded => write!(f, "succeeded"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Skipped => write!(f, "skipped"),
        }
    }
}

/// Final state of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Succeeded,
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Succeeded => write!(f, "succeeded"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Record of one task's execution within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRun {
    pub task_id: TaskId,
    pub state: TaskState,

    /// Attempts made; zero when the task never started
    pub attempts: u32,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Failure or skip reason, if any
    pub error: Option<String>,
}

/// Outcome of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub pipeline: String,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// Per-task records in execution-plan order
    pub task_runs: Vec<TaskRun>,
}

impl RunSummary {
    /// Look up a task record by id
    pub fn task(&self, id: &str) -> Option<&TaskRun> {
        self.task_runs.iter().find(|t| t.task_id.as_str() == id)
    }

    /// True when every task succeeded
    pub fn is_success(&self) -> bool {
        matches!(self.state, RunState::Succeeded)
    }
}

/// Sequential driver for pipeline runs
pub struct PipelineRunner {
    client: Arc<dyn WarehouseClient>,
    retry: RetryPolicy,
    credentials: HashMap<String, StorageCredentials>,
}

impl PipelineRunner {
    /// Create a runner over the given warehouse client
    pub fn new(client: Arc<dyn WarehouseClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            credentials: HashMap::new(),
        }
    }

    /// Set the retry policy applied to connectivity failures
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Pre-seed credentials for an id, bypassing environment lookup
    pub fn with_credentials(
        mut self,
        id: impl Into<String>,
        credentials: StorageCredentials,
    ) -> Self {
        self.credentials.insert(id.into(), credentials);
        self
    }

    fn credentials_for(&self, id: &str) -> playlog_warehouse::Result<StorageCredentials> {
        if let Some(credentials) = self.credentials.get(id) {
            return Ok(credentials.clone());
        }
        resolve_credentials(id)
    }

    /// Execute one run of the pipeline.
    ///
    /// Returns an error only when the pipeline itself cannot be compiled;
    /// task failures are reflected in the summary's state.
    pub async fn run(&self, pipeline: &Pipeline) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let plan = pipeline.compile()?;
        let started_at = Utc::now();

        info!(
            run_id = %run_id,
            pipeline = %pipeline.name,
            tasks = plan.order.len(),
            "Starting pipeline run"
        );

        let mut states: HashMap<TaskId, TaskState> = plan
            .order
            .iter()
            .cloned()
            .map(|id| (id, TaskState::Pending))
            .collect();
        let mut task_runs = Vec::with_capacity(plan.order.len());

        for task_id in &plan.order {
            let task = pipeline
                .task(task_id)
                .ok_or_else(|| Error::Internal(format!("task {task_id} missing from pipeline")))?;

            // Upstream tasks are finalized by now; anything short of success
            // propagates a skip.
            let blocked = pipeline
                .upstream_of(task_id)
                .into_iter()
                .find(|up| states.get(*up).copied() != Some(TaskState::Succeeded));

            if let Some(upstream) = blocked {
                warn!(
                    run_id = %run_id,
                    task = %task_id,
                    upstream = %upstream,
                    "Skipping task, upstream did not succeed"
                );
                states.insert(task_id.clone(), TaskState::Skipped);
                task_runs.push(TaskRun {
                    task_id: task_id.clone(),
                    state: TaskState::Skipped,
                    attempts: 0,
                    started_at: None,
                    completed_at: None,
                    error: Some(format!("upstream task {upstream} did not succeed")),
                });
                continue;
            }

            let record = self.run_task(run_id, task).await;
            states.insert(task_id.clone(), record.state);
            task_runs.push(record);
        }

        let state = if task_runs.iter().all(|t| t.state == TaskState::Succeeded) {
            RunState::Succeeded
        } else {
            RunState::Failed
        };

        match state {
            RunState::Succeeded => info!(run_id = %run_id, "Pipeline run succeeded"),
            RunState::Failed => error!(run_id = %run_id, "Pipeline run failed"),
        }

        Ok(RunSummary {
            run_id,
            pipeline: pipeline.name.clone(),
            state,
            started_at,
            completed_at: Utc::now(),
            task_runs,
        })
    }

    /// Execute a single task, re-attempting retryable failures per policy
    async fn run_task(&self, run_id: Uuid, task: &Task) -> TaskRun {
        let started_at = Utc::now();
        let mut attempts = 0;

        info!(
            run_id = %run_id,
            task = %task.id,
            kind = task.kind.kind_name(),
            "Executing task"
        );

        loop {
            attempts += 1;

            match self.execute_kind(&task.kind).await {
                Ok(()) => {
                    return TaskRun {
                        task_id: task.id.clone(),
                        state: TaskState::Succeeded,
                        attempts,
                        started_at: Some(started_at),
                        completed_at: Some(Utc::now()),
                        error: None,
                    };
                }
                Err(e) if e.is_retryable() && self.retry.should_retry(attempts - 1) => {
                    warn!(
                        run_id = %run_id,
                        task = %task.id,
                        attempt = attempts,
                        delay_secs = self.retry.retry_delay.as_secs(),
                        error = %e,
                        "Task attempt failed, retrying"
                    );
                    tokio::time::sleep(self.retry.retry_delay).await;
                }
                Err(e) => {
                    error!(
                        run_id = %run_id,
                        task = %task.id,
                        attempts = attempts,
                        error = %e,
                        "Task failed"
                    );
                    return TaskRun {
                        task_id: task.id.clone(),
                        state: TaskState::Failed,
                        attempts,
                        started_at: Some(started_at),
                        completed_at: Some(Utc::now()),
                        error: Some(e.to_string()),
                    };
                }
            }
        }
    }

    async fn execute_kind(&self, kind: &TaskKind) -> Result<()> {
        match kind {
            TaskKind::Start | TaskKind::End => Ok(()),
            TaskKind::StageToWarehouse(config) => {
                let credentials = self.credentials_for(&config.credentials_id)?;
                operators::stage_to_warehouse(self.client.as_ref(), config, &credentials)
                    .await
                    .map(|_| ())
            }
            TaskKind::LoadFact(config) => operators::load_fact(self.client.as_ref(), config)
                .await
                .map(|_| ()),
            TaskKind::LoadDimension(config) => {
                operators::load_dimension(self.client.as_ref(), config)
                    .await
                    .map(|_| ())
            }
            TaskKind::QualityCheck(config) => {
                operators::run_quality_checks(self.client.as_ref(), config).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedWarehouse;
    use playlog_core::pipelines::{songplays, SongplaysSettings};
    use std::time::Duration;

    const DIMS: [&str; 4] = [
        "load_user_dim",
        "load_song_dim",
        "load_artist_dim",
        "load_time_dim",
    ];

    fn runner(warehouse: ScriptedWarehouse) -> PipelineRunner {
        PipelineRunner::new(Arc::new(warehouse))
            .with_retry_policy(RetryPolicy::none())
            .with_credentials(
                "lake",
                StorageCredentials {
                    access_key_id: "AKIDTEST".to_string(),
                    secret_access_key: "testsecret".to_string(),
                },
            )
    }

    #[tokio::test]
    async fn test_clean_run_succeeds_end_to_end() {
        let runner = runner(ScriptedWarehouse::default());
        let pipeline = songplays(&SongplaysSettings::default()).unwrap();

        let summary = runner.run(&pipeline).await.unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.task_runs.len(), 10);
        for record in &summary.task_runs {
            assert_eq!(record.state, TaskState::Succeeded, "{}", record.task_id);
        }
        assert_eq!(summary.task("stop_execution").unwrap().attempts, 1);
    }

    #[tokio::test]
    async fn test_fact_failure_skips_all_dimension_loads() {
        let warehouse = ScriptedWarehouse::default().fail_statement("INSERT INTO songplays");
        let runner = runner(warehouse);
        let pipeline = songplays(&SongplaysSettings::default()).unwrap();

        let summary = runner.run(&pipeline).await.unwrap();

        assert!(!summary.is_success());
        assert_eq!(
            summary.task("load_songplays_fact").unwrap().state,
            TaskState::Failed
        );
        for dim in DIMS {
            assert_eq!(summary.task(dim).unwrap().state, TaskState::Skipped);
            assert_eq!(summary.task(dim).unwrap().attempts, 0);
        }
        assert_eq!(
            summary.task("quality_checks").unwrap().state,
            TaskState::Skipped
        );
        assert_eq!(
            summary.task("stop_execution").unwrap().state,
            TaskState::Skipped
        );
    }

    #[tokio::test]
    async fn test_staging_failure_prevents_fact_load() {
        let warehouse = ScriptedWarehouse::default().fail_statement("COPY staging_events");
        let runner = runner(warehouse);
        let pipeline = songplays(&SongplaysSettings::default()).unwrap();

        let summary = runner.run(&pipeline).await.unwrap();

        assert!(!summary.is_success());
        assert_eq!(
            summary.task("stage_events").unwrap().state,
            TaskState::Failed
        );
        // The sibling staging task has no edge to the failed one and still runs.
        assert_eq!(
            summary.task("stage_songs").unwrap().state,
            TaskState::Succeeded
        );
        assert_eq!(
            summary.task("load_songplays_fact").unwrap().state,
            TaskState::Skipped
        );
        for dim in DIMS {
            assert_eq!(summary.task(dim).unwrap().state, TaskState::Skipped);
        }
    }

    #[tokio::test]
    async fn test_quality_failure_fails_run_and_skips_end_marker() {
        let warehouse = ScriptedWarehouse::default().scalar("title IS NULL", Some(2));
        let runner = runner(warehouse);
        let pipeline = songplays(&SongplaysSettings::default()).unwrap();

        let summary = runner.run(&pipeline).await.unwrap();

        assert!(!summary.is_success());
        let quality = summary.task("quality_checks").unwrap();
        assert_eq!(quality.state, TaskState::Failed);
        assert!(quality.error.as_ref().unwrap().contains("assertion 0"));
        assert_eq!(
            summary.task("stop_execution").unwrap().state,
            TaskState::Skipped
        );
        // Everything upstream of the checks already completed.
        for dim in DIMS {
            assert_eq!(summary.task(dim).unwrap().state, TaskState::Succeeded);
        }
    }

    #[tokio::test]
    async fn test_connectivity_failure_is_retried() {
        let warehouse =
            ScriptedWarehouse::default().fail_connectivity("INSERT INTO songplays", 2);
        let runner = runner(warehouse).with_retry_policy(RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::ZERO,
        });
        let pipeline = songplays(&SongplaysSettings::default()).unwrap();

        let summary = runner.run(&pipeline).await.unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.task("load_songplays_fact").unwrap().attempts, 3);
    }

    #[tokio::test]
    async fn test_statement_failure_is_not_retried() {
        let warehouse = ScriptedWarehouse::default().fail_statement("INSERT INTO songplays");
        let runner = runner(warehouse).with_retry_policy(RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::ZERO,
        });
        let pipeline = songplays(&SongplaysSettings::default()).unwrap();

        let summary = runner.run(&pipeline).await.unwrap();

        assert!(!summary.is_success());
        assert_eq!(summary.task("load_songplays_fact").unwrap().attempts, 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted_fails_task() {
        let warehouse =
            ScriptedWarehouse::default().fail_connectivity("INSERT INTO songplays", 10);
        let runner = runner(warehouse).with_retry_policy(RetryPolicy {
            max_retries: 2,
            retry_delay: Duration::ZERO,
        });
        let pipeline = songplays(&SongplaysSettings::default()).unwrap();

        let summary = runner.run(&pipeline).await.unwrap();

        assert!(!summary.is_success());
        let fact = summary.task("load_songplays_fact").unwrap();
        assert_eq!(fact.state, TaskState::Failed);
        assert_eq!(fact.attempts, 3);
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_staging_task() {
        // No seeded credentials and no environment entry for this id.
        let runner = PipelineRunner::new(Arc::new(ScriptedWarehouse::default()))
            .with_retry_policy(RetryPolicy::none());
        let settings = SongplaysSettings {
            credentials_id: "credentials_never_configured".to_string(),
            ..SongplaysSettings::default()
        };
        let pipeline = songplays(&settings).unwrap();

        let summary = runner.run(&pipeline).await.unwrap();

        assert!(!summary.is_success());
        assert_eq!(
            summary.task("stage_events").unwrap().state,
            TaskState::Failed
        );
    }
}
