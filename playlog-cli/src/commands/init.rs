//! Init command

use crate::config::Settings;
use anyhow::{Context, Result};
use playlog_core::sql;
use playlog_warehouse::{resolve_connection, Warehouse, WarehouseClient};
use tracing::info;

pub async fn execute(settings: &Settings) -> Result<()> {
    let database_url = resolve_connection(&settings.pipeline.connection_id)
        .context("resolving warehouse connection")?;
    let warehouse = Warehouse::connect(&database_url)
        .await
        .context("connecting to warehouse")?;

    for statement in sql::CREATE_TABLES {
        warehouse
            .execute(statement)
            .await
            .context("creating warehouse tables")?;
    }

    info!(tables = sql::CREATE_TABLES.len(), "Warehouse tables ready");
    Ok(())
}
