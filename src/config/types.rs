use crate::url::LinkBase;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Bucket-Ferry
///
/// Every section has defaults, so an empty file (or no file at all) is a
/// valid configuration; secrets normally arrive through the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Page cap used when a job does not specify one
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Timeout for a single page GET (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for establishing a connection (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Resolve relative links against the linking page or the start URL
    #[serde(rename = "link-base", default)]
    pub link_base: LinkBase,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            link_base: LinkBase::default(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL)
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Repository archive configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Branch whose archive is downloaded
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Timeout for the whole archive download (seconds)
    #[serde(rename = "download-timeout-secs", default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Size of the buffer the archive is streamed through (bytes)
    #[serde(rename = "chunk-size", default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Base URL archives are downloaded from
    #[serde(rename = "download-base", default = "default_download_base")]
    pub download_base: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            branch: default_branch(),
            download_timeout_secs: default_download_timeout(),
            chunk_size: default_chunk_size(),
            download_base: default_download_base(),
        }
    }
}

/// Object storage configuration
///
/// Credentials are usually left out of the file and supplied through
/// `R2_ACCOUNT_ID`, `R2_ACCESS_KEY`, `R2_SECRET_KEY` and `R2_BUCKET_NAME`.
#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "account-id", default)]
    pub account_id: Option<String>,

    #[serde(rename = "access-key", default)]
    pub access_key: Option<String>,

    #[serde(rename = "secret-key", default)]
    pub secret_key: Option<String>,

    #[serde(default)]
    pub bucket: Option<String>,

    /// Overrides the endpoint derived from the account id
    #[serde(rename = "endpoint-url", default)]
    pub endpoint_url: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    /// Timeout for a single object upload (seconds)
    #[serde(rename = "upload-timeout-secs", default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_id: None,
            access_key: None,
            secret_key: None,
            bucket: None,
            endpoint_url: None,
            region: default_region(),
            upload_timeout_secs: default_upload_timeout(),
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("account_id", &self.account_id)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("bucket", &self.bucket)
            .field("endpoint_url", &self.endpoint_url)
            .field("region", &self.region)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .finish()
    }
}

impl StorageConfig {
    /// Endpoint to send requests to: the explicit override, or
    /// `https://<account-id>.r2.cloudflarestorage.com`
    pub fn endpoint(&self) -> Option<String> {
        if let Some(endpoint) = &self.endpoint_url {
            return Some(endpoint.trim_end_matches('/').to_string());
        }
        self.account_id
            .as_ref()
            .map(|id| format!("https://{}.r2.cloudflarestorage.com", id))
    }
}

/// HTTP server and job configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory job workspaces are created in (system temp dir when unset)
    #[serde(rename = "workspace-root", default)]
    pub workspace_root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            workspace_root: None,
        }
    }
}

fn default_max_pages() -> usize {
    100
}

fn default_request_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_crawler_name() -> String {
    "BucketFerry".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_download_timeout() -> u64 {
    300
}

fn default_chunk_size() -> usize {
    8192
}

fn default_download_base() -> String {
    "https://github.com".to_string()
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_upload_timeout() -> u64 {
    60
}

fn default_port() -> u16 {
    5000
}
