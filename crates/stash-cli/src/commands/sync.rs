use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use stash_core::auth::{CredentialStore, TokenRefresher};
use stash_core::config::StashConfig;
use stash_core::db::SyncRunRecord;
use stash_core::platforms::{RedditClient, TwitterClient};
use stash_core::services::BookmarkStore;
use stash_core::sync::{BookmarkSource, SyncCoordinator, SyncOutcome, SyncPolicy, SyncReport};
use stash_core::Platform;

use crate::cli::SyncTarget;
use crate::commands::common::{now_ms, open_store};
use crate::config::CliConfig;
use crate::credentials::KeyringCredentials;
use crate::error::CliError;

pub async fn run_sync(target: SyncTarget, config: &CliConfig, db_path: &Path) -> Result<(), CliError> {
    let settings = config.stash_config()?;
    let store = open_store(db_path, Platform::Twitter).await?;

    sync_each(target.platforms(), |platform| {
        sync_one(platform, &settings, store.for_platform(platform))
    })
    .await
}

/// Sync every platform in turn; one platform failing never stops the rest
pub async fn sync_each<F, Fut>(platforms: Vec<Platform>, mut run_one: F) -> Result<(), CliError>
where
    F: FnMut(Platform) -> Fut,
    Fut: Future<Output = Result<SyncOutcome, CliError>>,
{
    let mut failed = Vec::new();
    for platform in platforms {
        match run_one(platform).await {
            Ok(outcome) => println!("{}", format_outcome(platform, &outcome)),
            Err(error) => {
                tracing::warn!(%platform, "Sync failed: {}", error);
                eprintln!("{}", format_failure(platform, &error));
                failed.push(platform.to_string());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::SyncFailed(failed.join(", ")))
    }
}

async fn sync_one(
    platform: Platform,
    settings: &StashConfig,
    store: BookmarkStore,
) -> Result<SyncOutcome, CliError> {
    match platform {
        Platform::Twitter => sync_platform(TwitterClient::new(settings.twitter.clone())?, store).await,
        Platform::Reddit => sync_platform(RedditClient::new(settings.reddit.clone())?, store).await,
    }
}

/// Run one coordinator to completion and log the run in `sync_runs`
async fn sync_platform<C>(client: C, store: BookmarkStore) -> Result<SyncOutcome, CliError>
where
    C: BookmarkSource + TokenRefresher + Clone,
{
    let platform = client.platform();
    let credentials =
        CredentialStore::with_persistence(client.clone(), KeyringCredentials::new(platform))?;
    let coordinator = Arc::new(SyncCoordinator::new(
        Arc::new(client),
        Arc::new(store.clone()),
        Arc::new(credentials),
        SyncPolicy::for_platform(platform),
    ));

    let outcome = coordinator.spawn_sync().await?;
    if let SyncOutcome::Completed(report) = &outcome {
        store.record_run(&run_record(platform, report, now_ms())).await?;
    }
    Ok(outcome)
}

pub fn run_record(platform: Platform, report: &SyncReport, finished_at: i64) -> SyncRunRecord {
    SyncRunRecord {
        platform,
        finished_at,
        stop_reason: report.stop_reason.to_string(),
        new_items: i64::try_from(report.new_items).unwrap_or(i64::MAX),
        persisted_items: i64::try_from(report.items_persisted + report.thread_items_persisted)
            .unwrap_or(i64::MAX),
    }
}

pub fn format_outcome(platform: Platform, outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::AlreadyRunning => format!("{platform}: sync already running"),
        SyncOutcome::Unauthenticated => CliError::NotSignedIn(platform.to_string()).to_string(),
        SyncOutcome::Completed(report) => {
            let mut parts = vec![format!(
                "{platform}: {} new, {} stored from {} page(s) (stopped: {})",
                report.new_items,
                report.items_persisted + report.thread_items_persisted,
                report.pages_fetched,
                report.stop_reason
            )];
            if report.backfills_started > 0 {
                parts.push(format!(
                    "{} thread(s) backfilled",
                    report.backfills_started - report.backfills_failed
                ));
            }
            if report.refresh_attempted && !report.refreshed {
                parts.push("token refresh failed".to_string());
            }
            parts.join(", ")
        }
    }
}

pub fn format_failure(platform: Platform, error: &CliError) -> String {
    format!("{platform}: sync failed: {error}")
}
