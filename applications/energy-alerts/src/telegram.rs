use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

/// Client for the two Telegram bot API calls this worker needs.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub username: Option<String>,
}

impl TelegramClient {
    pub fn new(bot_token: &str, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
        })
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let response: ApiResponse<serde_json::Value> = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        anyhow::ensure!(response.ok, "Telegram rejected sendMessage");
        Ok(())
    }

    /// Fetch updates after `offset`. The caller advances the offset past
    /// the highest update id it has seen, which acknowledges them.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let mut request = self.http.get(format!("{}/getUpdates", self.base_url));
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset.to_string())]);
        }

        let response: ApiResponse<Vec<Update>> =
            request.send().await?.error_for_status()?.json().await?;

        anyhow::ensure!(response.ok, "Telegram rejected getUpdates");
        Ok(response.result.unwrap_or_default())
    }
}
