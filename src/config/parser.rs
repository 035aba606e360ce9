use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are not applied here; see [`load_config_from_env`].
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use bucket_ferry::config::load_config;
///
/// let config = load_config(Path::new("ferry.toml")).unwrap();
/// println!("Max pages: {}", config.crawler.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the optional config file, then overlays the process environment
///
/// A `.env` file in the working directory is read first when present.
pub fn load_config_from_env(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Ok(dotenv) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", dotenv.display());
    }

    let mut config = match path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Applies environment overrides using the given lookup
///
/// | Variable | Setting |
/// |----------|---------|
/// | `R2_ACCOUNT_ID` | `storage.account-id` |
/// | `R2_ACCESS_KEY` | `storage.access-key` |
/// | `R2_SECRET_KEY` | `storage.secret-key` |
/// | `R2_BUCKET_NAME` | `storage.bucket` |
/// | `R2_ENDPOINT_URL` | `storage.endpoint-url` |
/// | `PORT` | `server.port` |
///
/// Empty values are ignored.
pub fn apply_env<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("R2_ACCOUNT_ID") {
        config.storage.account_id = Some(v);
    }
    if let Some(v) = get("R2_ACCESS_KEY") {
        config.storage.access_key = Some(v);
    }
    if let Some(v) = get("R2_SECRET_KEY") {
        config.storage.secret_key = Some(v);
    }
    if let Some(v) = get("R2_BUCKET_NAME") {
        config.storage.bucket = Some(v);
    }
    if let Some(v) = get("R2_ENDPOINT_URL") {
        config.storage.endpoint_url = Some(v);
    }
    if let Some(v) = get("PORT") {
        config.server.port = v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Validation(format!("PORT must be a port number, got '{}'", v)))?;
    }

    Ok(())
}
