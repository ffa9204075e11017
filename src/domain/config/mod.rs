//! Configuration domain

pub mod app_config;

pub use app_config::{
    AppConfig, DEFAULT_BACKEND_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_ATTEMPTS,
};
