//! Persistent CLI configuration.
//!
//! Values saved here fill in for the `STASH_*` environment variables that
//! `stash_core::config` reads; the environment always wins.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stash_core::config::StashConfig;
use stash_core::util::normalize_text_option;

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "cli-config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default)]
    pub twitter: TwitterSettings,
    #[serde(default)]
    pub reddit: RedditSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TwitterSettings {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

/// The Reddit client secret is deliberately absent: it only comes from
/// `STASH_REDDIT_CLIENT_SECRET`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedditSettings {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("stash").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

impl CliConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Value the config file holds for a `STASH_*` variable name
    pub fn file_value(&self, name: &str) -> Option<String> {
        match name {
            "STASH_TWITTER_CLIENT_ID" => self.twitter.client_id.clone(),
            "STASH_TWITTER_API_BASE_URL" => self.twitter.api_base_url.clone(),
            "STASH_REDDIT_CLIENT_ID" => self.reddit.client_id.clone(),
            "STASH_REDDIT_API_BASE_URL" => self.reddit.api_base_url.clone(),
            "STASH_REDDIT_USER_AGENT" => self.reddit.user_agent.clone(),
            _ => None,
        }
    }

    /// Client settings from the process environment layered over this file
    pub fn stash_config(&self) -> Result<StashConfig, CliError> {
        self.stash_config_with(|name| std::env::var(name).ok())
    }

    pub fn stash_config_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<StashConfig, CliError> {
        StashConfig::from_lookup(|name| {
            normalize_text_option(env(name)).or_else(|| self.file_value(name))
        })
        .map_err(|error| CliError::Config(error.to_string()))
    }

    fn normalize(&mut self) {
        self.db_path = normalize_text_option(self.db_path.take());
        self.twitter.client_id = normalize_text_option(self.twitter.client_id.take());
        self.twitter.api_base_url = normalize_text_option(self.twitter.api_base_url.take());
        self.reddit.client_id = normalize_text_option(self.reddit.client_id.take());
        self.reddit.api_base_url = normalize_text_option(self.reddit.api_base_url.take());
        self.reddit.user_agent = normalize_text_option(self.reddit.user_agent.take());
    }
}
