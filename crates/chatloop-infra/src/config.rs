//! Chat loop configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.chat-loop/` by default)
//! and deserializes it into [`ChatConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use chatloop_types::config::ChatConfig;
use chatloop_types::error::ConfigError;

pub const CONFIG_FILE: &str = "config.toml";

/// Default config location: `{data_dir}/config.toml`.
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Parse a config document.
pub fn parse_chat_config(content: &str) -> Result<ChatConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Load configuration from `path`.
///
/// - Missing file: returns [`ChatConfig::default()`].
/// - Unreadable or invalid file: logs a warning and returns the default.
pub async fn load_chat_config(path: &Path) -> ChatConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return ChatConfig::default();
        }
        Err(err) => {
            let err = ConfigError::Read(err.to_string());
            tracing::warn!("Failed to load {}: {err}, using defaults", path.display());
            return ChatConfig::default();
        }
    };

    match parse_chat_config(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to load {}: {err}, using defaults", path.display());
            ChatConfig::default()
        }
    }
}
