use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use energy_api::handlers::AppState;
use energy_api::routes::create_router;
use energy_api::services::{ChartService, DeviceService, LogService, SummaryService};
use energy_api::store::StoreClient;
use energy_api::subscription::SubscriptionCache;
use energy_api::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "energy_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting energy-api service");

    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());

    let config = Config::load(&config_path)?;
    info!("Configuration loaded from: {}", config_path);

    let store = Arc::new(StoreClient::new(&config.store)?);
    info!("Store client ready: base_url={}", config.store.base_url);

    let cache = SubscriptionCache::new(
        store.clone(),
        Duration::from_secs(config.store.poll_interval_secs),
    );

    let state = AppState {
        devices: DeviceService::new(store.clone()),
        charts: ChartService::new(cache),
        summary: SummaryService::new(store.clone()),
        logs: LogService::new(store),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
