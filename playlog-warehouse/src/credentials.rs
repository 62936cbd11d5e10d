//! Object-storage credential resolution
//!
//! Credential identifiers are opaque; the access key pair is resolved from
//! the host environment and never embedded in operator definitions. The
//! secret is masked in Debug output.

use crate::{Error, Result};

/// Access key pair for reading from object storage
#[derive(Clone, PartialEq, Eq)]
pub struct StorageCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"********")
            .finish()
    }
}

/// Environment variables holding the key pair for a credential id
pub fn credentials_env_vars(credentials_id: &str) -> (String, String) {
    let prefix = credentials_id.to_uppercase().replace('-', "_");
    (
        format!("{prefix}_ACCESS_KEY_ID"),
        format!("{prefix}_SECRET_ACCESS_KEY"),
    )
}

/// Resolve an opaque credential id to an access key pair
pub fn resolve_credentials(credentials_id: &str) -> Result<StorageCredentials> {
    let (key_var, secret_var) = credentials_env_vars(credentials_id);

    let access_key_id = std::env::var(&key_var).map_err(|_| {
        Error::Credentials(format!(
            "{key_var} not set for credential id '{credentials_id}'"
        ))
    })?;
    let secret_access_key = std::env::var(&secret_var).map_err(|_| {
        Error::Credentials(format!(
            "{secret_var} not set for credential id '{credentials_id}'"
        ))
    })?;

    Ok(StorageCredentials {
        access_key_id,
        secret_access_key,
    })
}
