use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub store_url: String,
    pub telegram_bot_token: String,
    pub poll_interval_secs: u64,
    pub discovery_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            store_url: env::var("STORE_URL").context("STORE_URL must be set")?,
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN must be set")?,
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .context("POLL_INTERVAL_SECS must be a number")?,
            discovery_interval_secs: env::var("DISCOVERY_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("DISCOVERY_INTERVAL_SECS must be a number")?,
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a number")?,
        })
    }
}
