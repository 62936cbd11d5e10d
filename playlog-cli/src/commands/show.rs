//! Show command

use crate::config::Settings;
use anyhow::{Context, Result};
use playlog_core::pipelines::songplays;

pub fn execute(settings: &Settings) -> Result<()> {
    let pipeline = songplays(&settings.pipeline).context("building pipeline")?;

    println!("pipeline: {}", pipeline.name);
    println!(
        "schedule: {} (start {}, catchup {})",
        pipeline.schedule.cron, pipeline.schedule.start_date, pipeline.schedule.catchup
    );

    println!("tasks:");
    for task in pipeline.tasks() {
        println!("  {} ({})", task.id, task.kind.kind_name());
    }

    println!("edges:");
    for (upstream, downstream) in pipeline.edges() {
        println!("  {upstream} -> {downstream}");
    }

    Ok(())
}
