//! Shipped pipeline definitions
//!
//! Explicit graph builders returning immutable pipelines. Nothing here
//! registers with a scheduler or mutates process-wide state.

use crate::graph::{GraphError, Pipeline, PipelineBuilder};
use crate::schedule::Schedule;
use crate::sql;
use crate::task::{
    JsonFormat, LoadDimensionConfig, LoadFactConfig, QualityAssertion, QualityCheckConfig,
    StageConfig, Task, TaskKind,
};
use chrono::{TimeZone, Utc};

/// Deployment-specific settings for the songplays pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct SongplaysSettings {
    /// Object-storage path holding play-event JSON
    pub events_path: String,

    /// Object-storage path holding song metadata JSON
    pub songs_path: String,

    /// Field layout of the event JSON
    pub events_format: JsonFormat,

    /// Warehouse schema the quality checks run against
    pub schema: String,

    /// Opaque warehouse connection identifier
    pub connection_id: String,

    /// Opaque object-storage credential identifier
    pub credentials_id: String,
}

impl Default for SongplaysSettings {
    fn default() -> Self {
        Self {
            events_path: "s3://play-events-lake/log_data".to_string(),
            songs_path: "s3://play-events-lake/song_data".to_string(),
            events_format: JsonFormat::PathFile {
                path: "s3://play-events-lake/log_json_path.json".to_string(),
            },
            schema: "public".to_string(),
            connection_id: "warehouse".to_string(),
            credentials_id: "lake".to_string(),
        }
    }
}

/// Build the hourly songplays pipeline: stage events and songs in parallel,
/// load the fact table, reload the four dimensions, then run quality checks.
///
/// Dimension loads are wired downstream of the fact load; this warehouse has
/// always loaded in that order and the wiring preserves it as declared.
pub fn songplays(settings: &SongplaysSettings) -> Result<Pipeline, GraphError> {
    let start_date = Utc
        .with_ymd_and_hms(2024, 8, 21, 0, 0, 0)
        .single()
        .expect("fixed start date is valid");
    let schedule = Schedule::hourly(start_date);

    let connection = settings.connection_id.clone();

    PipelineBuilder::new("songplays", schedule)
        .task(Task::start("begin_execution"))
        .task(Task::new(
            "stage_events",
            TaskKind::StageToWarehouse(StageConfig {
                table: "staging_events".to_string(),
                source_path: settings.events_path.clone(),
                format: settings.events_format.clone(),
                connection_id: connection.clone(),
                credentials_id: settings.credentials_id.clone(),
            }),
        ))
        .task(Task::new(
            "stage_songs",
            TaskKind::StageToWarehouse(StageConfig {
                table: "staging_songs".to_string(),
                source_path: settings.songs_path.clone(),
                format: JsonFormat::Auto,
                connection_id: connection.clone(),
                credentials_id: settings.credentials_id.clone(),
            }),
        ))
        .task(Task::new(
            "load_songplays_fact",
            TaskKind::LoadFact(LoadFactConfig {
                table: "songplays".to_string(),
                select_sql: sql::SONGPLAY_INSERT.to_string(),
                connection_id: connection.clone(),
            }),
        ))
        .task(Task::new(
            "load_user_dim",
            TaskKind::LoadDimension(LoadDimensionConfig {
                table: "users".to_string(),
                select_sql: sql::USER_INSERT.to_string(),
                truncate: true,
                connection_id: connection.clone(),
            }),
        ))
        .task(Task::new(
            "load_song_dim",
            TaskKind::LoadDimension(LoadDimensionConfig {
                table: "songs".to_string(),
                select_sql: sql::SONG_INSERT.to_string(),
                truncate: true,
                connection_id: connection.clone(),
            }),
        ))
        .task(Task::new(
            "load_artist_dim",
            TaskKind::LoadDimension(LoadDimensionConfig {
                table: "artists".to_string(),
                select_sql: sql::ARTIST_INSERT.to_string(),
                truncate: true,
                connection_id: connection.clone(),
            }),
        ))
        .task(Task::new(
            "load_time_dim",
            TaskKind::LoadDimension(LoadDimensionConfig {
                table: "time".to_string(),
                select_sql: sql::TIME_INSERT.to_string(),
                truncate: true,
                connection_id: connection.clone(),
            }),
        ))
        .task(Task::new(
            "quality_checks",
            TaskKind::QualityCheck(QualityCheckConfig {
                tables: vec![
                    "songplays".to_string(),
                    "songs".to_string(),
                    "artists".to_string(),
                    "time".to_string(),
                    "users".to_string(),
                ],
                schema: settings.schema.clone(),
                assertions: vec![QualityAssertion::new(
                    "SELECT COUNT(*) FROM {schema}.songs WHERE title IS NULL",
                    0,
                )],
                connection_id: connection,
            }),
        ))
        .task(Task::end("stop_execution"))
        .fan(&["begin_execution"], &["stage_events", "stage_songs"])
        .fan(&["stage_events", "stage_songs"], &["load_songplays_fact"])
        .fan(
            &["load_songplays_fact"],
            &[
                "load_user_dim",
                "load_song_dim",
                "load_artist_dim",
                "load_time_dim",
            ],
        )
        .fan(
            &[
                "load_user_dim",
                "load_song_dim",
                "load_artist_dim",
                "load_time_dim",
            ],
            &["quality_checks"],
        )
        .fan(&["quality_checks"], &["stop_execution"])
        .build()
}
