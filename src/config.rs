use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GmailError, Result};

/// Config file the CLI reads when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "gmail-relay.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccountConfig {
    /// Address to operate as when no --account flag is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_token_cache_dir")]
    pub token_cache_dir: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_cache_dir: default_token_cache_dir(),
        }
    }
}

fn default_credentials_path() -> String {
    "credentials.json".to_string()
}

fn default_token_cache_dir() -> String {
    ".gmail-relay".to_string()
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| GmailError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GmailError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| GmailError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.auth.credentials_path.trim().is_empty() {
            return Err(GmailError::ConfigError(
                "auth.credentials_path cannot be empty".to_string(),
            ));
        }

        if self.auth.token_cache_dir.trim().is_empty() {
            return Err(GmailError::ConfigError(
                "auth.token_cache_dir cannot be empty".to_string(),
            ));
        }

        if let Some(email) = &self.account.email {
            let trimmed = email.trim();
            if trimmed.is_empty() {
                return Err(GmailError::ConfigError(
                    "account.email cannot be empty".to_string(),
                ));
            }
            if !trimmed.contains('@') || trimmed.chars().any(char::is_whitespace) {
                return Err(GmailError::ConfigError(format!(
                    "account.email '{}' is not a plain address like user@example.com",
                    trimmed
                )));
            }
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Account to operate as
    ///
    /// Resolution order: CLI flag, then the configured address, then the
    /// `GMAIL_RELAY_ACCOUNT` environment value passed in by the caller.
    /// Blank candidates fall through to the next source.
    pub fn resolve_account(&self, flag: Option<&str>, env_fallback: Option<&str>) -> Option<String> {
        let candidates = [
            flag.map(str::to_string),
            self.account.email.clone(),
            env_fallback.map(str::to_string),
        ];

        candidates
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }
}
