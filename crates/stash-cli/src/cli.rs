use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stash_core::Platform;

#[derive(Parser)]
#[command(name = "stash")]
#[command(about = "Keep an offline mirror of your Twitter/X bookmarks and Reddit saved items")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pull new saved items from the remote platforms
    Sync {
        /// Platform to sync
        #[arg(value_enum, default_value_t = SyncTarget::All)]
        target: SyncTarget,
    },
    /// List mirrored items, newest saves first
    List {
        /// Platform to list
        #[arg(short, long, value_enum)]
        platform: PlatformArg,
        /// Items per page
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show every stored item of a conversation
    Thread {
        /// Platform the conversation belongs to
        #[arg(short, long, value_enum)]
        platform: PlatformArg,
        /// Conversation (thread) id
        conversation_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage platform credentials stored in the OS keychain
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Configure persistent CLI settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Show sign-in state, item counts and recent sync runs
    Status {
        /// Number of recent runs to show per platform
        #[arg(short, long, default_value = "3")]
        runs: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PlatformArg {
    #[value(alias = "x")]
    Twitter,
    Reddit,
}

impl From<PlatformArg> for Platform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Twitter => Self::Twitter,
            PlatformArg::Reddit => Self::Reddit,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SyncTarget {
    #[value(alias = "x")]
    Twitter,
    Reddit,
    All,
}

impl SyncTarget {
    pub fn platforms(self) -> Vec<Platform> {
        match self {
            Self::Twitter => vec![Platform::Twitter],
            Self::Reddit => vec![Platform::Reddit],
            Self::All => Platform::ALL.to_vec(),
        }
    }
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store tokens and account for a platform
    Set {
        #[arg(short, long, value_enum)]
        platform: PlatformArg,
        /// Remote account (Twitter user id, Reddit username)
        #[arg(long, value_name = "ID")]
        account: String,
        /// OAuth refresh token
        #[arg(long, value_name = "TOKEN")]
        refresh_token: String,
        /// Optional OAuth access token (refreshed on first sync when omitted)
        #[arg(long, value_name = "TOKEN")]
        access_token: Option<String>,
    },
    /// Show whether a platform has usable credentials
    Status {
        /// Platform to inspect (all when omitted)
        #[arg(short, long, value_enum)]
        platform: Option<PlatformArg>,
    },
    /// Remove stored credentials for a platform
    Logout {
        #[arg(short, long, value_enum)]
        platform: PlatformArg,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current config file
    Show,
    /// Create or update the config file
    Init {
        /// Default database path
        #[arg(long, value_name = "PATH")]
        db_path: Option<String>,
        /// Twitter/X OAuth2 client id
        #[arg(long, value_name = "ID")]
        twitter_client_id: Option<String>,
        /// Twitter/X API base URL
        #[arg(long, value_name = "URL")]
        twitter_api_base_url: Option<String>,
        /// Reddit OAuth client id
        #[arg(long, value_name = "ID")]
        reddit_client_id: Option<String>,
        /// Reddit API base URL
        #[arg(long, value_name = "URL")]
        reddit_api_base_url: Option<String>,
        /// User agent sent to Reddit
        #[arg(long, value_name = "UA")]
        reddit_user_agent: Option<String>,
    },
}
