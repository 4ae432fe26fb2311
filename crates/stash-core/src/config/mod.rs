//! Runtime configuration for the platform clients.
//!
//! Values come from the environment through `from_lookup`, so front ends can
//! layer their own sources (a config file, test maps) on top of `env::vars`.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::util::is_http_url;

const DEFAULT_TWITTER_API_BASE_URL: &str = "https://api.x.com";
const DEFAULT_REDDIT_API_BASE_URL: &str = "https://oauth.reddit.com";
const DEFAULT_REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "30";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Twitter/X API v2 client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwitterConfig {
    pub api_base_url: String,
    pub token_url: String,
    /// OAuth2 public client id; required only for token refresh
    pub client_id: Option<String>,
    pub timeout: Duration,
}

/// Reddit OAuth API client settings
#[derive(Clone, PartialEq, Eq)]
pub struct RedditConfig {
    pub api_base_url: String,
    pub token_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Reddit rejects requests without a descriptive user agent
    pub user_agent: String,
    pub timeout: Duration,
}

impl fmt::Debug for RedditConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RedditConfig")
            .field("api_base_url", &self.api_base_url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashConfig {
    pub twitter: TwitterConfig,
    pub reddit: RedditConfig,
}

impl StashConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timeout_secs =
            value_or_default(&lookup, "STASH_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)
                .parse::<u64>()
                .map_err(|_| {
                    ConfigError::Invalid(
                        "STASH_HTTP_TIMEOUT_SECS must be an integer in [1, 300]".to_string(),
                    )
                })?;
        if !(1..=300).contains(&timeout_secs) {
            return Err(ConfigError::Invalid(
                "STASH_HTTP_TIMEOUT_SECS must be in [1, 300]".to_string(),
            ));
        }
        let timeout = Duration::from_secs(timeout_secs);

        let twitter_base = http_url_or_default(
            &lookup,
            "STASH_TWITTER_API_BASE_URL",
            DEFAULT_TWITTER_API_BASE_URL,
        )?;
        let twitter_token_url = http_url_or_default(
            &lookup,
            "STASH_TWITTER_TOKEN_URL",
            &format!("{twitter_base}/2/oauth2/token"),
        )?;

        let reddit_base = http_url_or_default(
            &lookup,
            "STASH_REDDIT_API_BASE_URL",
            DEFAULT_REDDIT_API_BASE_URL,
        )?;
        let reddit_token_url =
            http_url_or_default(&lookup, "STASH_REDDIT_TOKEN_URL", DEFAULT_REDDIT_TOKEN_URL)?;

        let reddit_client_id = optional_trimmed(&lookup, "STASH_REDDIT_CLIENT_ID");
        let reddit_client_secret = optional_trimmed(&lookup, "STASH_REDDIT_CLIENT_SECRET");
        if reddit_client_secret.is_some() && reddit_client_id.is_none() {
            return Err(ConfigError::MissingVar("STASH_REDDIT_CLIENT_ID"));
        }

        Ok(Self {
            twitter: TwitterConfig {
                api_base_url: twitter_base,
                token_url: twitter_token_url,
                client_id: optional_trimmed(&lookup, "STASH_TWITTER_CLIENT_ID"),
                timeout,
            },
            reddit: RedditConfig {
                api_base_url: reddit_base,
                token_url: reddit_token_url,
                client_id: reddit_client_id,
                client_secret: reddit_client_secret,
                user_agent: value_or_default(
                    &lookup,
                    "STASH_REDDIT_USER_AGENT",
                    &format!("stash/{} (bookmark mirror)", env!("CARGO_PKG_VERSION")),
                ),
                timeout,
            },
        })
    }
}

fn http_url_or_default(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> Result<String, ConfigError> {
    let value = value_or_default(lookup, name, default);
    if !is_http_url(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must start with http:// or https://"
        )));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
