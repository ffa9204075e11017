//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

use crate::domain::recording::Duration;

/// MyAvatar - voice-driven avatar video generation
#[derive(Parser, Debug)]
#[command(name = "myavatar")]
#[command(version = "1.0.0")]
#[command(about = "Record your voice and generate an avatar video")]
#[command(long_about = None)]
pub struct Cli {
    /// Avatar to render (see `myavatar avatars` for the list)
    #[arg(short = 'a', long, value_name = "ID")]
    pub avatar: Option<String>,

    /// Title for the generated video
    #[arg(short = 't', long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Max recording duration before auto-stop (e.g., 30s, 5m)
    #[arg(long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Backend base URL
    #[arg(long, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Delay between status polls in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Status poll attempts before giving up
    #[arg(long, value_name = "N")]
    pub poll_max_attempts: Option<u32>,

    /// Keep polling past transient network errors (they still count
    /// toward the attempt budget)
    #[arg(long)]
    pub poll_past_transport_errors: bool,

    /// Copy the result URL to the clipboard
    #[arg(short = 'c', long)]
    pub clipboard: bool,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available avatars
    Avatars,
    /// List previously generated videos
    Videos,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed options for the record-and-generate run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub avatar_id: Option<String>,
    pub title: Option<String>,
    pub max_duration: Duration,
    pub clipboard: bool,
    pub notify: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "backend_url",
    "api_token",
    "avatar_id",
    "max_duration",
    "poll_interval_ms",
    "poll_max_attempts",
    "encodings",
    "poll_past_transport_errors",
    "clipboard",
    "notify",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
