//! Validate command

use crate::config::Settings;
use anyhow::{Context, Result};
use playlog_core::pipelines::songplays;

pub fn execute(settings: &Settings) -> Result<()> {
    let pipeline = songplays(&settings.pipeline).context("building pipeline")?;
    let plan = pipeline.compile().context("compiling pipeline")?;

    println!("pipeline: {}", plan.pipeline);
    println!("execution order:");
    for (position, task_id) in plan.order.iter().enumerate() {
        println!("  {:>2}. {task_id}", position + 1);
    }

    Ok(())
}
