//! Connection identifier resolution
//!
//! Operators carry opaque connection identifiers; the host environment maps
//! them to connection URLs. The convention is one environment variable per
//! identifier: `PLAYLOG_CONN_<ID>` with the id uppercased.

use crate::{Error, Result};

/// Environment variable holding the URL for a connection id
pub fn connection_env_var(connection_id: &str) -> String {
    format!(
        "PLAYLOG_CONN_{}",
        connection_id.to_uppercase().replace('-', "_")
    )
}

/// Resolve an opaque connection id to a database URL
pub fn resolve_connection(connection_id: &str) -> Result<String> {
    let var = connection_env_var(connection_id);
    std::env::var(&var)
        .map_err(|_| Error::UnknownConnection(format!("{connection_id} ({var} not set)")))
}
