//! Configuration module for Bucket-Ferry
//!
//! This module handles loading, parsing, and validating the TOML configuration
//! file and overlaying secrets from the environment.
//!
//! # Example
//!
//! ```no_run
//! use bucket_ferry::config::load_config_from_env;
//!
//! let config = load_config_from_env(None).unwrap();
//! println!("Crawler will fetch at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArchiveConfig, Config, CrawlerConfig, ServerConfig, StorageConfig, UserAgentConfig,
};
pub use validation::{require_storage, StorageCredentials};

// Re-export parser functions
pub use parser::{apply_env, load_config, load_config_from_env};
