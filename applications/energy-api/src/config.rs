use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How often live subscriptions re-poll the store.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from a YAML file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        // Expand environment variables in the format $(VAR_NAME)
        let expanded = expand_env_vars(&content);

        let mut config: Config = serde_yaml::from_str(&expanded)?;

        // STORE_URL always wins over the file, which keeps one deployment
        // manifest usable against staging and production stores.
        if let Ok(url) = std::env::var("STORE_URL") {
            config.store.base_url = url;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config("Server port cannot be 0".to_string()));
        }

        if self.store.base_url.is_empty() {
            return Err(AppError::Config(
                "Store base_url cannot be empty".to_string(),
            ));
        }

        if !self.store.base_url.starts_with("http://") && !self.store.base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "Store base_url must be an http(s) URL, got: {}",
                self.store.base_url
            )));
        }

        if self.store.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "Store poll_interval_secs cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Expand environment variables in the format $(VAR_NAME)
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    let re = regex::Regex::new(r"\$\(([A-Z_][A-Z0-9_]*)\)").unwrap();

    for cap in re.captures_iter(content) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    result
}
