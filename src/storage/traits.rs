//! Object store capability and error types

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while writing objects
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage is not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to sign request: {0}")]
    Signing(String),

    #[error("Upload of '{key}' timed out")]
    Timeout { key: String },

    #[error("Upload of '{key}' failed: {message}")]
    Transport { key: String, message: String },

    #[error("Upload of '{key}' rejected with HTTP {status}: {body}")]
    Status {
        key: String,
        status: u16,
        body: String,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Canned access control applied to a written object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectAcl {
    Private,
    #[default]
    PublicRead,
}

impl ObjectAcl {
    /// Value of the `x-amz-acl` header
    pub fn as_header(&self) -> &'static str {
        match self {
            ObjectAcl::Private => "private",
            ObjectAcl::PublicRead => "public-read",
        }
    }
}

/// One object to write
#[derive(Debug, Clone)]
pub struct PutObject<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub body: Vec<u8>,
    pub content_type: &'a str,
    pub acl: ObjectAcl,
}

/// A bucket-addressed object store
///
/// Implementations must be shareable across jobs; the pipeline holds one
/// behind an `Arc` for the life of the process.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes one object, replacing any existing object under the same key
    async fn put_object(&self, object: PutObject<'_>) -> StorageResult<()>;
}
