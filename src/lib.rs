//! Bucket-Ferry: crawl a website or fetch a GitHub archive, publish it to a bucket
//!
//! This crate implements the ingestion pipeline behind the ferry service: a
//! breadth-first, same-origin crawler that converts pages to Markdown, an
//! alternate source that unpacks a repository archive, and a fail-fast
//! publisher that uploads the resulting file set to S3-compatible storage.

pub mod archive;
pub mod config;
pub mod convert;
pub mod crawler;
pub mod pipeline;
pub mod publish;
pub mod server;
pub mod storage;
pub mod url;
pub mod workspace;

use thiserror::Error;

/// Main error type for Bucket-Ferry operations
#[derive(Debug, Error)]
pub enum FerryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Archive error: {0}")]
    Archive(#[from] archive::ArchiveError),

    #[error("No pages crawled successfully")]
    NothingCrawled,

    #[error("No pages converted to Markdown")]
    NothingConverted,

    #[error("No files uploaded")]
    NothingUploaded,

    #[error("Failed to upload {key}: {source}")]
    Upload {
        key: String,
        source: storage::StorageError,
    },

    #[error("Failed to read {key} for upload: {source}")]
    ReadArtifact { key: String, source: std::io::Error },

    #[error("Crawl cancelled after {pages} pages")]
    Cancelled { pages: usize },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// A single page that could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Error crawling {url}: {message}")]
    Transport { url: String, message: String },
}

/// A single page that could not be turned into an artifact
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Error converting {url} to Markdown: {source}")]
    Write { url: String, source: std::io::Error },

    #[error("Skipping {url}: {path} was already produced by another page")]
    DuplicatePath { url: String, path: String },
}

/// Result type alias for Bucket-Ferry operations
pub type Result<T> = std::result::Result<T, FerryError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{JobError, JobReport, Pipeline, Stage};
pub use crate::url::{normalize_url, validate_site_url, UrlNormalizer};
