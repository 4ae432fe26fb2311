//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: items and the rows hanging off them
async fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        1,
        &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            "CREATE TABLE IF NOT EXISTS items (
                platform TEXT NOT NULL,
                id TEXT NOT NULL,
                author_id TEXT NOT NULL,
                conversation_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                rank INTEGER NOT NULL,
                is_referenced INTEGER NOT NULL DEFAULT 0,
                text TEXT NOT NULL DEFAULT '',
                url TEXT,
                PRIMARY KEY (platform, id)
            )",
            "CREATE INDEX IF NOT EXISTS idx_items_feed
                ON items(platform, is_referenced, rank DESC)",
            "CREATE INDEX IF NOT EXISTS idx_items_conversation
                ON items(platform, conversation_id)",
            "CREATE TABLE IF NOT EXISTS authors (
                platform TEXT NOT NULL,
                id TEXT NOT NULL,
                username TEXT NOT NULL,
                display_name TEXT,
                PRIMARY KEY (platform, id)
            )",
            "CREATE TABLE IF NOT EXISTS item_metrics (
                platform TEXT NOT NULL,
                item_id TEXT NOT NULL,
                likes INTEGER NOT NULL DEFAULT 0,
                reposts INTEGER NOT NULL DEFAULT 0,
                replies INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (platform, item_id)
            )",
            "CREATE TABLE IF NOT EXISTS media (
                platform TEXT NOT NULL,
                key TEXT NOT NULL,
                item_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                url TEXT,
                PRIMARY KEY (platform, key)
            )",
            "CREATE INDEX IF NOT EXISTS idx_media_item ON media(platform, item_id)",
        ],
    )
    .await
}

/// Migration to version 2: per-run sync log
async fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        2,
        &[
            "CREATE TABLE IF NOT EXISTS sync_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                platform TEXT NOT NULL,
                finished_at INTEGER NOT NULL,
                stop_reason TEXT NOT NULL,
                new_items INTEGER NOT NULL,
                persisted_items INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_sync_runs_platform
                ON sync_runs(platform, finished_at DESC)",
        ],
    )
    .await
}

/// Run `statements` and record `version` in one transaction.
///
/// libsql doesn't have `execute_batch`, so each statement runs separately.
async fn apply(conn: &Connection, version: i32, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn
        .execute("INSERT INTO schema_version (version) VALUES (?)", [version])
        .await
    {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {version} (latest {CURRENT_VERSION})");
    Ok(())
}
