//! SQL templates for the play-event star schema
//!
//! Named statement bodies, one per warehouse table, plus the helpers that
//! compose full statements. Operators never build SQL themselves; every
//! piece of statement text lives here.

use crate::task::JsonFormat;

/// INSERT body for the songplays fact table: staged events joined to staged
/// songs on title, artist and duration
pub const SONGPLAY_INSERT: &str = "\
SELECT
    md5(events.sessionid::TEXT || events.start_time::TEXT) AS songplay_id,
    events.start_time,
    events.userid,
    events.level,
    songs.song_id,
    songs.artist_id,
    events.sessionid,
    events.location,
    events.useragent
FROM (
    SELECT TIMESTAMP 'epoch' + ts / 1000 * INTERVAL '1 second' AS start_time, *
    FROM staging_events
    WHERE page = 'NextSong'
) events
LEFT JOIN staging_songs songs
    ON events.song = songs.title
    AND events.artist = songs.artist_name
    AND events.length = songs.duration";

/// INSERT body for the users dimension
pub const USER_INSERT: &str = "\
SELECT DISTINCT userid, firstname, lastname, gender, level
FROM staging_events
WHERE page = 'NextSong'";

/// INSERT body for the songs dimension
pub const SONG_INSERT: &str = "\
SELECT DISTINCT song_id, title, artist_id, year, duration
FROM staging_songs";

/// INSERT body for the artists dimension
pub const ARTIST_INSERT: &str = "\
SELECT DISTINCT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM staging_songs";

/// INSERT body for the time dimension, derived from loaded fact rows
pub const TIME_INSERT: &str = "\
SELECT start_time,
    EXTRACT(hour FROM start_time),
    EXTRACT(day FROM start_time),
    EXTRACT(week FROM start_time),
    EXTRACT(month FROM start_time),
    EXTRACT(year FROM start_time),
    EXTRACT(dayofweek FROM start_time)
FROM songplays";

/// DDL for the staging, fact and dimension tables, in creation order
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS staging_events (
    artist VARCHAR,
    auth VARCHAR,
    firstname VARCHAR,
    gender VARCHAR,
    iteminsession INTEGER,
    lastname VARCHAR,
    length NUMERIC,
    level VARCHAR,
    location VARCHAR,
    method VARCHAR,
    page VARCHAR,
    registration NUMERIC,
    sessionid INTEGER,
    song VARCHAR,
    status INTEGER,
    ts BIGINT,
    useragent VARCHAR,
    userid INTEGER
)",
    "CREATE TABLE IF NOT EXISTS staging_songs (
    num_songs INTEGER,
    artist_id VARCHAR,
    artist_name VARCHAR,
    artist_latitude NUMERIC,
    artist_longitude NUMERIC,
    artist_location VARCHAR,
    song_id VARCHAR,
    title VARCHAR,
    duration NUMERIC,
    year INTEGER
)",
    "CREATE TABLE IF NOT EXISTS songplays (
    songplay_id VARCHAR(32),
    start_time TIMESTAMP,
    userid INTEGER,
    level VARCHAR,
    song_id VARCHAR,
    artist_id VARCHAR,
    sessionid INTEGER,
    location VARCHAR,
    useragent VARCHAR
)",
    "CREATE TABLE IF NOT EXISTS users (
    userid INTEGER,
    firstname VARCHAR,
    lastname VARCHAR,
    gender VARCHAR,
    level VARCHAR
)",
    "CREATE TABLE IF NOT EXISTS songs (
    song_id VARCHAR,
    title VARCHAR,
    artist_id VARCHAR,
    year INTEGER,
    duration NUMERIC
)",
    "CREATE TABLE IF NOT EXISTS artists (
    artist_id VARCHAR,
    artist_name VARCHAR,
    artist_location VARCHAR,
    artist_latitude NUMERIC,
    artist_longitude NUMERIC
)",
    "CREATE TABLE IF NOT EXISTS time (
    start_time TIMESTAMP,
    hour INTEGER,
    day INTEGER,
    week INTEGER,
    month INTEGER,
    year INTEGER,
    weekday INTEGER
)",
];

/// Compose the append-only `INSERT INTO <table> <select>;` statement
pub fn insert_into(table: &str, select_sql: &str) -> String {
    format!("INSERT INTO {table}\n{select_sql};")
}

/// Compose the statement emptying a dimension table
pub fn truncate_table(table: &str) -> String {
    format!("TRUNCATE {table};")
}

/// Compose the bulk copy loading JSON objects under `source_path` into
/// `table`.
///
/// The rendered statement embeds the access key pair; callers log the
/// target and source, never the statement text.
pub fn copy_json(
    table: &str,
    source_path: &str,
    access_key_id: &str,
    secret_access_key: &str,
    format: &JsonFormat,
) -> String {
    let format_spec = match format {
        JsonFormat::Auto => "'auto'".to_string(),
        JsonFormat::PathFile { path } => format!("'{path}'"),
    };

    format!(
        "COPY {table}\n\
         FROM '{source_path}'\n\
         ACCESS_KEY_ID '{access_key_id}' SECRET_ACCESS_KEY '{secret_access_key}'\n\
         FORMAT AS JSON {format_spec};"
    )
}
