mod alerts;
mod config;
mod store;
mod subscribers;
mod telegram;

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::store::StoreClient;
use crate::subscribers::Command;
use crate::telegram::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "energy_alerts=info".into()),
        )
        .init();

    info!("Starting energy-alerts worker");

    let config = Config::from_env()?;
    info!("Store: {}", config.store_url);
    info!("Sweep interval: {}s", config.poll_interval_secs);
    info!("Subscriber discovery interval: {}s", config.discovery_interval_secs);

    let store = StoreClient::new(&config.store_url, config.request_timeout_secs)?;
    let telegram = TelegramClient::new(&config.telegram_bot_token, config.request_timeout_secs)?;

    // Chat discovery loop: chats send /start or /stop to the bot; the
    // registry and the getUpdates offset both live in the store, so a
    // restart neither drops subscribers nor replays old commands.
    let discovery_store = store.clone();
    let discovery_telegram = telegram.clone();
    let discovery_interval = config.discovery_interval_secs;
    tokio::spawn(async move {
        let mut offset = match discovery_store.fetch_updates_offset().await {
            Ok(offset) => offset,
            Err(e) => {
                warn!("could not load updates offset, starting fresh: {e}");
                None
            }
        };

        loop {
            match discovery_telegram.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        let next = update.update_id + 1;
                        if offset.map_or(true, |o| next > o) {
                            offset = Some(next);
                            if let Err(e) = discovery_store.store_updates_offset(next).await {
                                warn!("failed to persist updates offset: {e}");
                            }
                        }

                        let Some(message) = update.message else { continue };
                        let Some(text) = message.text else { continue };
                        let Some(command) = subscribers::parse_command(&text) else { continue };
                        let chat_id = message.chat.id;

                        let result = match command {
                            Command::Start => {
                                let username =
                                    message.from.as_ref().and_then(|u| u.username.as_deref());
                                discovery_store
                                    .register_chat(chat_id, username, &Utc::now().to_rfc3339())
                                    .await
                            }
                            Command::Stop => discovery_store.deactivate_chat(chat_id).await,
                        };

                        match result {
                            Ok(()) => {
                                info!(chat_id, command = ?command, "subscription change");
                                if let Err(e) =
                                    discovery_telegram.send_message(chat_id, command.reply()).await
                                {
                                    warn!(chat_id, "failed to confirm command: {e}");
                                }
                            }
                            Err(e) => {
                                warn!(chat_id, "failed to persist subscription change: {e}");
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("update poll failed: {e}");
                }
            }

            sleep(Duration::from_secs(discovery_interval)).await;
        }
    });

    // Main alert sweep loop.
    let mut alerted = HashSet::new();
    loop {
        let today = Utc::now().date_naive();

        match store.fetch_active_chats().await {
            Ok(subscribers) => {
                if let Err(e) =
                    alerts::run_sweep(&store, &telegram, &subscribers, &mut alerted, today).await
                {
                    error!("Alert sweep failed: {e}");
                }
            }
            Err(e) => {
                error!("Failed to load alert subscribers: {e}");
            }
        }

        sleep(Duration::from_secs(config.poll_interval_secs)).await;
    }
}
