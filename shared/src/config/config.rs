use std::fs;
use tracing::{debug, error, info};

use crate::types::client_config::{AppConfig, ConfigError};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: AppConfig = toml::from_str(&contents)?;

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let base = config.api.base_url.trim();
    if base.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "api.base_url cannot be empty".into(),
        ));
    }

    // The transport builds request URIs by string concatenation, so reject
    // anything that is not an http(s) origin up front.
    if !base.starts_with("http://") && !base.starts_with("https://") {
        return Err(ConfigError::InvalidConfig(
            "api.base_url must start with http:// or https://".into(),
        ));
    }

    if config.api.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "api.request_timeout_secs must be greater than 0".into(),
        ));
    }

    if config.storage.state_file.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "storage.state_file cannot be empty".into(),
        ));
    }

    Ok(())
}
