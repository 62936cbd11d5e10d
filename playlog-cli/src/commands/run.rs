//! Run command

use crate::config::Settings;
use anyhow::{bail, Context, Result};
use playlog_core::pipelines::songplays;
use playlog_runtime::{PipelineRunner, RetryPolicy};
use playlog_warehouse::{resolve_connection, Warehouse};
use std::sync::Arc;
use tracing::info;

pub async fn execute(settings: &Settings) -> Result<()> {
    let pipeline = songplays(&settings.pipeline).context("building pipeline")?;

    let database_url = resolve_connection(&settings.pipeline.connection_id)
        .context("resolving warehouse connection")?;
    let warehouse = Warehouse::connect(&database_url)
        .await
        .context("connecting to warehouse")?;

    let runner = PipelineRunner::new(Arc::new(warehouse)).with_retry_policy(RetryPolicy {
        max_retries: settings.task_retries,
        retry_delay: settings.task_retry_delay,
    });

    let summary = runner.run(&pipeline).await.context("running pipeline")?;

    info!(
        run_id = %summary.run_id,
        state = %summary.state,
        "Run finished"
    );

    println!("run {} [{}]", summary.run_id, summary.state);
    for record in &summary.task_runs {
        match &record.error {
            Some(error) => println!(
                "  {:<22} {:>9}  attempts={}  {error}",
                record.task_id.as_str(),
                record.state.to_string(),
                record.attempts
            ),
            None => println!(
                "  {:<22} {:>9}  attempts={}",
                record.task_id.as_str(),
                record.state.to_string(),
                record.attempts
            ),
        }
    }

    if !summary.is_success() {
        bail!("pipeline run failed");
    }

    Ok(())
}
