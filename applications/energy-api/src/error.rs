use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store request failed: {0}")]
    Store(#[from] reqwest::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Core(#[from] energy_core::CoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Store(e) => {
                tracing::error!("store request failed: {e}");
                (StatusCode::BAD_GATEWAY, "Upstream store error".to_string())
            }
            AppError::Unavailable(msg) => {
                tracing::error!("store unavailable: {msg}");
                (StatusCode::BAD_GATEWAY, "Upstream store error".to_string())
            }
            AppError::Core(e) => {
                // Malformed identifiers mean the store holds corrupt data;
                // surface that instead of charting garbage.
                tracing::error!("corrupt reading data: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Corrupt reading data in store".to_string(),
                )
            }
            other => {
                tracing::error!("internal error: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
