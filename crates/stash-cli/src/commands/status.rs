use std::path::Path;

use serde::Serialize;
use stash_core::services::BookmarkStore;
use stash_core::Platform;

use crate::commands::common::{format_run_timestamp, open_store, sync_run_to_item, SyncRunItem};
use crate::credentials::load_stored_credentials;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct PlatformStatus {
    pub platform: Platform,
    pub signed_in: bool,
    pub account_id: Option<String>,
    pub items: usize,
    pub recent_runs: Vec<SyncRunItem>,
}

pub async fn run_status(runs: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path, Platform::Twitter).await?;
    let mut statuses = Vec::with_capacity(Platform::ALL.len());
    for platform in Platform::ALL {
        statuses.push(platform_status(&store.for_platform(platform), runs).await?);
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else {
        for line in statuses.iter().flat_map(format_status_lines) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn platform_status(store: &BookmarkStore, runs: usize) -> Result<PlatformStatus, CliError> {
    let platform = store.platform();
    let credentials =
        load_stored_credentials(platform)?.filter(|credentials| credentials.is_authenticated());
    let recent_runs = store.recent_runs(runs).await?;

    Ok(PlatformStatus {
        platform,
        signed_in: credentials.is_some(),
        account_id: credentials.map(|credentials| credentials.account_id),
        items: store.count().await?,
        recent_runs: recent_runs.iter().map(sync_run_to_item).collect(),
    })
}

pub fn format_status_lines(status: &PlatformStatus) -> Vec<String> {
    let mut lines = vec![match &status.account_id {
        Some(account) => format!("{}: signed in as {account}", status.platform),
        None => format!("{}: not signed in", status.platform),
    }];
    lines.push(format!("  {} saved item(s)", status.items));

    if status.recent_runs.is_empty() {
        lines.push("  no sync runs recorded".to_string());
    }
    lines.extend(status.recent_runs.iter().map(|run| {
        format!(
            "  {}  {:<9}  new={} stored={}",
            format_run_timestamp(run.finished_at),
            run.stop_reason,
            run.new_items,
            run.persisted_items
        )
    }));
    lines
}
