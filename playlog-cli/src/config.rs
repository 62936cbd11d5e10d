//! CLI configuration
//!
//! Deployment settings loaded from environment variables, with the
//! pipeline's defaults applied when a variable is unset.

use anyhow::{Context, Result};
use playlog_core::{JsonFormat, SongplaysSettings};
use std::env;
use std::time::Duration;

/// Settings for one invocation of the CLI
#[derive(Debug, Clone)]
pub struct Settings {
    /// Pipeline declaration inputs
    pub pipeline: SongplaysSettings,

    /// Task attempts after the first, applied to connectivity failures
    pub task_retries: u32,

    /// Delay between task attempts
    pub task_retry_delay: Duration,
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// Environment variables:
    /// - `PLAYLOG_EVENTS_PATH` / `PLAYLOG_SONGS_PATH`: object-storage inputs
    /// - `PLAYLOG_EVENTS_JSONPATH`: layout file for event JSON, or `auto`
    /// - `PLAYLOG_SCHEMA`: warehouse schema (default `public`)
    /// - `PLAYLOG_CONNECTION_ID`: opaque warehouse connection id
    /// - `PLAYLOG_CREDENTIALS_ID`: opaque object-storage credential id
    /// - `PLAYLOG_TASK_RETRIES`: retry count (default 3)
    /// - `PLAYLOG_TASK_RETRY_DELAY_SECS`: delay between attempts (default 300)
    pub fn from_env() -> Result<Self> {
        let defaults = SongplaysSettings::default();

        let events_format = match env::var("PLAYLOG_EVENTS_JSONPATH") {
            Ok(value) if value == "auto" => JsonFormat::Auto,
            Ok(path) => JsonFormat::PathFile { path },
            Err(_) => defaults.events_format,
        };

        let pipeline = SongplaysSettings {
            events_path: env::var("PLAYLOG_EVENTS_PATH").unwrap_or(defaults.events_path),
            songs_path: env::var("PLAYLOG_SONGS_PATH").unwrap_or(defaults.songs_path),
            events_format,
            schema: env::var("PLAYLOG_SCHEMA").unwrap_or(defaults.schema),
            connection_id: env::var("PLAYLOG_CONNECTION_ID").unwrap_or(defaults.connection_id),
            credentials_id: env::var("PLAYLOG_CREDENTIALS_ID").unwrap_or(defaults.credentials_id),
        };

        let task_retries = env::var("PLAYLOG_TASK_RETRIES")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .context("PLAYLOG_TASK_RETRIES must be a non-negative integer")?;

        let delay_secs: u64 = env::var("PLAYLOG_TASK_RETRY_DELAY_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .context("PLAYLOG_TASK_RETRY_DELAY_SECS must be a non-negative integer")?;

        Ok(Self {
            pipeline,
            task_retries,
            task_retry_delay: Duration::from_secs(delay_secs),
        })
    }
}
