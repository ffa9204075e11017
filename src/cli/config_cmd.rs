//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::error::ConfigError;
use crate::domain::recording::{AudioEncoding, Duration};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    // Validate key
    if !is_valid_config_key(key) {
        return Err(unknown_key(key));
    }

    // Validate value based on key type
    validate_config_value(key, value)?;

    // Load existing config
    let mut config = store.load().await?;

    // Update the appropriate field
    match key {
        "backend_url" => config.backend_url = Some(value.to_string()),
        "api_token" => config.api_token = Some(value.to_string()),
        "avatar_id" => config.avatar_id = Some(value.to_string()),
        "max_duration" => config.max_duration = Some(value.to_string()),
        "poll_interval_ms" => config.poll_interval_ms = Some(parse_u64(key, value)?),
        "poll_max_attempts" => config.poll_max_attempts = Some(parse_u32(key, value)?),
        "encodings" => config.encodings = Some(parse_encoding_list(value)),
        "poll_past_transport_errors" => {
            config.poll_past_transport_errors = Some(parse_bool(key, value)?)
        }
        "clipboard" => config.clipboard = Some(parse_bool(key, value)?),
        "notify" => config.notify = Some(parse_bool(key, value)?),
        _ => unreachable!(), // Already validated
    }

    // Save config
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, display_value(key, value)));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(unknown_key(key));
    }

    let config = store.load().await?;

    let value = match key {
        "backend_url" => config.backend_url,
        "api_token" => config.api_token.map(|token| mask_token(&token)),
        "avatar_id" => config.avatar_id,
        "max_duration" => config.max_duration,
        "poll_interval_ms" => config.poll_interval_ms.map(|n| n.to_string()),
        "poll_max_attempts" => config.poll_max_attempts.map(|n| n.to_string()),
        "encodings" => config.encodings.map(|list| list.join(",")),
        "poll_past_transport_errors" => {
            config.poll_past_transport_errors.map(|b| b.to_string())
        }
        "clipboard" => config.clipboard.map(|b| b.to_string()),
        "notify" => config.notify.map(|b| b.to_string()),
        _ => unreachable!(),
    };

    match value {
        Some(v) => presenter.output(&v),
        None => presenter.output("(not set)"),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    let not_set = || "(not set)".to_string();

    presenter.key_value(
        "backend_url",
        config.backend_url.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value(
        "api_token",
        &config
            .api_token
            .map(|token| mask_token(&token))
            .unwrap_or_else(not_set),
    );
    presenter.key_value(
        "avatar_id",
        config.avatar_id.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value(
        "max_duration",
        config.max_duration.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value(
        "poll_interval_ms",
        &config
            .poll_interval_ms
            .map(|n| n.to_string())
            .unwrap_or_else(not_set),
    );
    presenter.key_value(
        "poll_max_attempts",
        &config
            .poll_max_attempts
            .map(|n| n.to_string())
            .unwrap_or_else(not_set),
    );
    presenter.key_value(
        "encodings",
        &config
            .encodings
            .map(|list| list.join(","))
            .unwrap_or_else(not_set),
    );
    presenter.key_value(
        "poll_past_transport_errors",
        &config
            .poll_past_transport_errors
            .map(|b| b.to_string())
            .unwrap_or_else(not_set),
    );
    presenter.key_value(
        "clipboard",
        &config
            .clipboard
            .map(|b| b.to_string())
            .unwrap_or_else(not_set),
    );
    presenter.key_value(
        "notify",
        &config.notify.map(|b| b.to_string()).unwrap_or_else(not_set),
    );

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    }
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "max_duration" => {
            value
                .parse::<Duration>()
                .map_err(|e| ConfigError::ValidationError {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
        }
        "poll_interval_ms" => {
            parse_u64(key, value)?;
        }
        "poll_max_attempts" => {
            let attempts = parse_u32(key, value)?;
            if attempts == 0 {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must be at least 1".to_string(),
                });
            }
        }
        "encodings" => {
            for name in split_encoding_names(value) {
                name.parse::<AudioEncoding>()
                    .map_err(|e| ConfigError::ValidationError {
                        key: key.to_string(),
                        message: format!("Unknown encoding '{}'. Valid encodings: flac, wav", e.0),
                    })?;
            }
        }
        "poll_past_transport_errors" | "clipboard" | "notify" => {
            parse_bool(key, value)?;
        }
        _ => {}
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: "Value must be 'true' or 'false'".to_string(),
        }),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::ValidationError {
            key: key.to_string(),
            message: "Value must be a non-negative integer".to_string(),
        })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::ValidationError {
            key: key.to_string(),
            message: "Value must be a non-negative integer".to_string(),
        })
}

fn split_encoding_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_encoding_list(value: &str) -> Vec<String> {
    split_encoding_names(value)
}

/// Mask a token for display, keeping just enough to recognize it
fn mask_token(token: &str) -> String {
    if token.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", &token[..4])
    }
}

fn display_value(key: &str, value: &str) -> String {
    if key == "api_token" {
        mask_token(value)
    } else {
        value.to_string()
    }
}
