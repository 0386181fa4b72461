pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod subscription;

pub use config::Config;
pub use error::{AppError, Result};
