use stash_core::util::{is_http_url, normalize_text_option};

use crate::cli::ConfigCommands;
use crate::config::{default_config_path, CliConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let path = default_config_path().map_err(CliError::Config)?;
            let config = CliConfig::load_from_path(&path).map_err(CliError::Config)?;
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigCommands::Init {
            db_path,
            twitter_client_id,
            twitter_api_base_url,
            reddit_client_id,
            reddit_api_base_url,
            reddit_user_agent,
        } => {
            let mut config = CliConfig::load().map_err(CliError::Config)?;
            apply_config_init(
                &mut config,
                ConfigInit {
                    db_path,
                    twitter_client_id,
                    twitter_api_base_url,
                    reddit_client_id,
                    reddit_api_base_url,
                    reddit_user_agent,
                },
            )?;
            let path = config.save().map_err(CliError::Config)?;
            println!("Saved CLI config to {}", path.display());
            Ok(())
        }
    }
}

/// Values passed to `stash config init`; `None` keeps the existing setting
#[derive(Debug, Default)]
pub struct ConfigInit {
    pub db_path: Option<String>,
    pub twitter_client_id: Option<String>,
    pub twitter_api_base_url: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_api_base_url: Option<String>,
    pub reddit_user_agent: Option<String>,
}

pub fn apply_config_init(config: &mut CliConfig, init: ConfigInit) -> Result<(), CliError> {
    let twitter_api_base_url = normalize_base_url(init.twitter_api_base_url)?;
    let reddit_api_base_url = normalize_base_url(init.reddit_api_base_url)?;

    if let Some(db_path) = normalize_text_option(init.db_path) {
        config.db_path = Some(db_path);
    }
    if let Some(client_id) = normalize_text_option(init.twitter_client_id) {
        config.twitter.client_id = Some(client_id);
    }
    if let Some(url) = twitter_api_base_url {
        config.twitter.api_base_url = Some(url);
    }
    if let Some(client_id) = normalize_text_option(init.reddit_client_id) {
        config.reddit.client_id = Some(client_id);
    }
    if let Some(url) = reddit_api_base_url {
        config.reddit.api_base_url = Some(url);
    }
    if let Some(user_agent) = normalize_text_option(init.reddit_user_agent) {
        config.reddit.user_agent = Some(user_agent);
    }
    Ok(())
}

pub fn normalize_base_url(value: Option<String>) -> Result<Option<String>, CliError> {
    let Some(url) = normalize_text_option(value) else {
        return Ok(None);
    };
    if !is_http_url(&url) {
        return Err(CliError::Config(format!(
            "'{url}' must start with http:// or https://"
        )));
    }
    Ok(Some(url.trim_end_matches('/').to_string()))
}
