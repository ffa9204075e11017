//! Configuration storage port interface

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for the persistent configuration file.
///
/// Stored values are partial: missing keys stay `None` and are filled in by
/// the defaults < file < env < CLI merge at startup.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the stored configuration. A missing file is an empty config,
    /// not an error.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Persist the given configuration, creating parent directories as
    /// needed.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the configuration file.
    fn path(&self) -> PathBuf;

    /// Whether the configuration file exists.
    fn exists(&self) -> bool;

    /// Write a fresh file populated with defaults.
    /// Fails with `AlreadyExists` if one is present.
    async fn init(&self) -> Result<(), ConfigError>;
}
