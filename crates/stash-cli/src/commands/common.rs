use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use stash_core::db::SyncRunRecord;
use stash_core::services::BookmarkStore;
use stash_core::{Item, Platform};

use crate::config::CliConfig;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct ItemListItem {
    pub platform: Platform,
    pub id: String,
    pub conversation_id: String,
    pub author_id: String,
    pub preview: String,
    pub text: String,
    pub url: Option<String>,
    pub created_at: String,
    pub rank: i64,
    pub is_referenced: bool,
}

#[derive(Debug, Serialize)]
pub struct SyncRunItem {
    pub platform: Platform,
    pub finished_at: i64,
    pub finished_at_iso: String,
    pub stop_reason: String,
    pub new_items: i64,
    pub persisted_items: i64,
}

pub async fn open_store(db_path: &Path, platform: Platform) -> Result<BookmarkStore, CliError> {
    Ok(BookmarkStore::open_path(db_path, platform).await?)
}

pub fn item_to_list_item(item: &Item) -> ItemListItem {
    ItemListItem {
        platform: item.platform,
        id: item.id.clone(),
        conversation_id: item.conversation_id.clone(),
        author_id: item.author_id.clone(),
        preview: item_preview(item, 80),
        text: item.text.clone(),
        url: item.url.clone(),
        created_at: item.created_at.clone(),
        rank: item.rank,
        is_referenced: item.is_referenced,
    }
}

pub fn sync_run_to_item(run: &SyncRunRecord) -> SyncRunItem {
    SyncRunItem {
        platform: run.platform,
        finished_at: run.finished_at,
        finished_at_iso: format_run_timestamp(run.finished_at),
        stop_reason: run.stop_reason.clone(),
        new_items: run.new_items,
        persisted_items: run.persisted_items,
    }
}

pub fn format_item_lines(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let id = item.id.chars().take(20).collect::<String>();
            let preview = item_preview(item, 50);
            let created = item.created_at.chars().take(10).collect::<String>();
            format!("{id:<20}  {preview:<50}  {created}")
        })
        .collect()
}

/// Thread view: replies indented under the conversation root
pub fn format_thread_lines(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let indent = if item.is_conversation_root() { "" } else { "  " };
            let author = if item.author_id.is_empty() {
                "(unknown)"
            } else {
                item.author_id.as_str()
            };
            format!("{indent}{author}: {}", item_preview(item, 100))
        })
        .collect()
}

pub fn item_preview(item: &Item, max_chars: usize) -> String {
    let first_line = item.text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_run_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &CliConfig) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path
        .or_else(|| env::var_os("STASH_DB_PATH").map(PathBuf::from))
        .or_else(|| config.db_path.as_ref().map(PathBuf::from))
    {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("stash").join("stash.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}
