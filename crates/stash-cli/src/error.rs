use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] stash_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Sync task failed: {0}")]
    SyncTask(#[from] tokio::task::JoinError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Sync failed for {0}")]
    SyncFailed(String),
    #[error("{0} is not signed in. Run `stash auth set --platform {0}` first.")]
    NotSignedIn(String),
}
