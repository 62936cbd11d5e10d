//! Pipeline-step operators
//!
//! Each operator wraps a single SQL statement issued through a borrowed
//! [`WarehouseClient`]. Errors propagate to the run driver untouched; no
//! operator retries or swallows a failure.

use crate::{Error, Result};
use playlog_core::sql;
use playlog_core::task::{
    LoadDimensionConfig, LoadFactConfig, QualityCheckConfig, StageConfig,
};
use playlog_warehouse::{StorageCredentials, WarehouseClient};
use tracing::{info, warn};

/// Copy raw JSON objects from object storage into the staging table.
///
/// One bulk COPY; a bad path, malformed JSON or permission failure surfaces
/// as an error with no partial-success reporting here.
pub async fn stage_to_warehouse(
    client: &dyn WarehouseClient,
    config: &StageConfig,
    credentials: &StorageCredentials,
) -> Result<u64> {
    info!(
        table = %config.table,
        source = %config.source_path,
        "Copying objects into staging table"
    );

    // The rendered statement embeds the key pair; log targets, never the text.
    let statement = sql::copy_json(
        &config.table,
        &config.source_path,
        &credentials.access_key_id,
        &credentials.secret_access_key,
        &config.format,
    );
    let rows = client.execute(&statement).await?;

    info!(table = %config.table, rows = rows, "Staging copy complete");
    Ok(rows)
}

/// Append transformed rows into the fact table.
///
/// Exactly one INSERT; never deletes or truncates. Re-running duplicates
/// rows unless the configured SELECT is itself idempotent.
pub async fn load_fact(client: &dyn WarehouseClient, config: &LoadFactConfig) -> Result<u64> {
    info!(table = %config.table, "Loading fact table");

    let statement = sql::insert_into(&config.table, &config.select_sql);
    let rows = client.execute(&statement).await?;

    info!(table = %config.table, rows = rows, "Fact load complete");
    Ok(rows)
}

/// Load a dimension table, optionally truncating it first.
///
/// The TRUNCATE and INSERT are separate statements on the same pool; if the
/// INSERT fails the table stays empty until the next successful run.
pub async fn load_dimension(
    client: &dyn WarehouseClient,
    config: &LoadDimensionConfig,
) -> Result<u64> {
    if config.truncate {
        info!(table = %config.table, "Truncating dimension table before load");
        client.execute(&sql::truncate_table(&config.table)).await?;
    }

    info!(table = %config.table, truncate = config.truncate, "Loading dimension table");
    let statement = sql::insert_into(&config.table, &config.select_sql);
    let rows = client.execute(&statement).await?;

    info!(table = %config.table, rows = rows, "Dimension load complete");
    Ok(rows)
}

/// Run the configured assertions in declaration order, stopping at the first
/// one that does not hold.
///
/// An assertion fails when the query returns no rows or when the first
/// scalar differs from the expected value.
pub async fn run_quality_checks(
    client: &dyn WarehouseClient,
    config: &QualityCheckConfig,
) -> Result<()> {
    info!(
        schema = %config.schema,
        tables = ?config.tables,
        assertions = config.assertions.len(),
        "Running data quality checks"
    );

    for (index, assertion) in config.assertions.iter().enumerate() {
        let statement = assertion.render(&config.schema);
        let actual = client.fetch_scalar(&statement).await?;

        match actual {
            Some(value) if value == assertion.expected => {
                info!(index = index, check = %statement, "Quality check passed");
            }
            other => {
                warn!(
                    index = index,
                    check = %statement,
                    expected = assertion.expected,
                    actual = ?other,
                    "Quality check failed"
                );
                return Err(Error::QualityCheck {
                    index,
                    check_sql: statement,
                    expected: assertion.expected,
                    actual: other,
                });
            }
        }
    }

    Ok(())
}
