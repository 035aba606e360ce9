//! Object storage for published files
//!
//! The publisher only sees [`ObjectStore`]. [`R2Client`] is the production
//! implementation: path-style requests signed with AWS SigV4, which works
//! against Cloudflare R2 and any other S3-compatible endpoint.

mod r2;
pub mod sigv4;
mod traits;

pub use r2::R2Client;
pub use traits::{ObjectAcl, ObjectStore, PutObject, StorageError, StorageResult};

use crate::config::{require_storage, StorageConfig};
use crate::FerryError;
use reqwest::Client;
use std::time::Duration;

/// Builds an [`R2Client`] from configuration
///
/// # Returns
///
/// * `Ok(R2Client)` - Every credential was present
/// * `Err(FerryError::Config)` - A credential or the endpoint is missing or invalid
pub fn connect(config: &StorageConfig, client: Client) -> Result<R2Client, FerryError> {
    let credentials = require_storage(config)?;
    Ok(R2Client::new(
        client,
        credentials,
        Duration::from_secs(config.upload_timeout_secs),
    ))
}
