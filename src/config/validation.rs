use crate::config::types::{ArchiveConfig, Config, CrawlerConfig, StorageConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Storage credentials are optional here; they are only required once a
/// storage client is built (see [`require_storage`]).
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_archive_config(&config.archive)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validated storage settings needed to talk to the bucket
#[derive(Clone)]
pub struct StorageCredentials {
    pub endpoint: Url,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("endpoint", &self.endpoint.as_str())
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Checks that every setting needed for uploads is present
pub fn require_storage(config: &StorageConfig) -> Result<StorageCredentials, ConfigError> {
    let endpoint = config
        .endpoint()
        .ok_or(ConfigError::Missing("R2_ACCOUNT_ID (or storage.endpoint-url)"))?;
    let endpoint = Url::parse(&endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid storage endpoint '{}': {}", endpoint, e)))?;

    let access_key = config
        .access_key
        .clone()
        .ok_or(ConfigError::Missing("R2_ACCESS_KEY"))?;
    let secret_key = config
        .secret_key
        .clone()
        .ok_or(ConfigError::Missing("R2_SECRET_KEY"))?;
    let bucket = config
        .bucket
        .clone()
        .ok_or(ConfigError::Missing("R2_BUCKET_NAME"))?;

    Ok(StorageCredentials {
        endpoint,
        access_key,
        secret_key,
        bucket,
        region: config.region.clone(),
    })
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates archive configuration
fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    if config.branch.is_empty()
        || config
            .branch
            .chars()
            .any(|c| c.is_whitespace() || c == '?' || c == '#')
    {
        return Err(ConfigError::Validation(format!(
            "branch must be a non-empty ref name, got '{}'",
            config.branch
        )));
    }

    if config.chunk_size < 1024 {
        return Err(ConfigError::Validation(format!(
            "chunk_size must be >= 1024 bytes, got {}",
            config.chunk_size
        )));
    }

    if config.download_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "download_timeout_secs must be >= 1, got {}",
            config.download_timeout_secs
        )));
    }

    Url::parse(&config.download_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid download_base: {}", e)))?;

    Ok(())
}

/// Validates the parts of the storage configuration that are present
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if let Some(account_id) = &config.account_id {
        if !account_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(format!(
                "account_id must be alphanumeric, got '{}'",
                account_id
            )));
        }
    }

    if let Some(endpoint) = &config.endpoint_url {
        Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint_url: {}", e)))?;
    }

    if let Some(bucket) = &config.bucket {
        validate_bucket_name(bucket)?;
    }

    if config.upload_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "upload_timeout_secs must be >= 1, got {}",
            config.upload_timeout_secs
        )));
    }

    Ok(())
}

/// S3-style bucket names: 3-63 characters of lowercase letters, digits, '-' and '.'
fn validate_bucket_name(bucket: &str) -> Result<(), ConfigError> {
    if bucket.len() < 3 || bucket.len() > 63 {
        return Err(ConfigError::Validation(format!(
            "bucket name must be 3-63 characters, got '{}'",
            bucket
        )));
    }

    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(ConfigError::Validation(format!(
            "bucket name '{}' contains invalid characters",
            bucket
        )));
    }

    if bucket.starts_with(['-', '.']) || bucket.ends_with(['-', '.']) {
        return Err(ConfigError::Validation(format!(
            "bucket name '{}' cannot start or end with '.' or '-'",
            bucket
        )));
    }

    Ok(())
}
