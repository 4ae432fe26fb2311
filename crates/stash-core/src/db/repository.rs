//! Bookmark repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{Item, ItemGraph, Platform};
use libsql::{params, Connection, Row, Value};

const ITEM_COLUMNS: &str =
    "platform, id, author_id, conversation_id, created_at, rank, is_referenced, text, url";

/// One finished sync run, as recorded in `sync_runs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRunRecord {
    pub platform: Platform,
    /// Unix ms
    pub finished_at: i64,
    pub stop_reason: String,
    pub new_items: i64,
    pub persisted_items: i64,
}

/// Trait for bookmark storage operations, scoped to one platform
#[allow(async_fn_in_trait)]
pub trait BookmarkRepository {
    /// Insert a graph, ignoring rows whose key already exists.
    ///
    /// The one exception: a row stored as referenced that now arrives as a
    /// top-level item is promoted and takes the new rank. Top-level rows are
    /// never touched again.
    ///
    /// Returns the number of item rows that were new or promoted.
    async fn insert_graph(&self, graph: &ItemGraph) -> Result<usize>;

    /// Highest-ranked item that is not merely referenced
    async fn latest_top_level_item(&self) -> Result<Option<Item>>;

    /// List top-level items, highest rank first
    async fn list_top_level(&self, limit: usize, offset: usize) -> Result<Vec<Item>>;

    /// Every stored item of a conversation, oldest first
    async fn list_thread(&self, conversation_id: &str) -> Result<Vec<Item>>;

    /// Get an item by ID
    async fn get(&self, id: &str) -> Result<Option<Item>>;

    /// Count top-level items
    async fn count_top_level(&self) -> Result<usize>;

    /// Append a finished run to the sync log
    async fn record_run(&self, run: &SyncRunRecord) -> Result<()>;

    /// Most recent runs, newest first
    async fn recent_runs(&self, limit: usize) -> Result<Vec<SyncRunRecord>>;
}

/// libSQL implementation of `BookmarkRepository`
pub struct LibSqlBookmarkRepository<'a> {
    conn: &'a Connection,
    platform: Platform,
}

impl<'a> LibSqlBookmarkRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection, platform: Platform) -> Self {
        Self { conn, platform }
    }

    async fn insert_graph_rows(&self, graph: &ItemGraph) -> Result<usize> {
        let mut inserted = 0usize;
        for item in graph.items() {
            let changed = self
                .conn
                .execute(
                    "INSERT INTO items
                        (platform, id, author_id, conversation_id, created_at, rank, is_referenced, text, url)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT(platform, id) DO UPDATE
                        SET is_referenced = 0, rank = excluded.rank
                        WHERE items.is_referenced = 1 AND excluded.is_referenced = 0",
                    params![
                        item.platform.as_str(),
                        item.id.as_str(),
                        item.author_id.as_str(),
                        item.conversation_id.as_str(),
                        item.created_at.as_str(),
                        item.rank,
                        i64::from(item.is_referenced),
                        item.text.as_str(),
                        optional_text(item.url.as_deref()),
                    ],
                )
                .await?;
            inserted += usize::try_from(changed).unwrap_or(0);
        }

        for author in &graph.authors {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO authors (platform, id, username, display_name)
                     VALUES (?, ?, ?, ?)",
                    params![
                        author.platform.as_str(),
                        author.id.as_str(),
                        author.username.as_str(),
                        optional_text(author.display_name.as_deref()),
                    ],
                )
                .await?;
        }

        for (item_id, metrics) in &graph.metrics {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO item_metrics (platform, item_id, likes, reposts, replies)
                     VALUES (?, ?, ?, ?, ?)",
                    params![
                        graph.root.platform.as_str(),
                        item_id.as_str(),
                        metrics.likes,
                        metrics.reposts,
                        metrics.replies,
                    ],
                )
                .await?;
        }

        for media in &graph.media {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO media (platform, key, item_id, kind, url)
                     VALUES (?, ?, ?, ?, ?)",
                    params![
                        media.platform.as_str(),
                        media.key.as_str(),
                        media.item_id.as_str(),
                        media.kind.as_str(),
                        optional_text(media.url.as_deref()),
                    ],
                )
                .await?;
        }

        Ok(inserted)
    }

    async fn query_items(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Item>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(parse_item(&row)?);
        }
        Ok(items)
    }
}

impl BookmarkRepository for LibSqlBookmarkRepository<'_> {
    async fn insert_graph(&self, graph: &ItemGraph) -> Result<usize> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let inserted = match self.insert_graph_rows(graph).await {
            Ok(inserted) => inserted,
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        };

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        Ok(inserted)
    }

    async fn latest_top_level_item(&self) -> Result<Option<Item>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE platform = ? AND is_referenced = 0
             ORDER BY rank DESC
             LIMIT 1"
        );
        let items = self
            .query_items(&sql, vec![Value::from(self.platform.as_str())])
            .await?;
        Ok(items.into_iter().next())
    }

    async fn list_top_level(&self, limit: usize, offset: usize) -> Result<Vec<Item>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE platform = ? AND is_referenced = 0
             ORDER BY rank DESC
             LIMIT ? OFFSET ?"
        );
        self.query_items(
            &sql,
            vec![
                Value::from(self.platform.as_str()),
                Value::Integer(limit as i64),
                Value::Integer(offset as i64),
            ],
        )
        .await
    }

    async fn list_thread(&self, conversation_id: &str) -> Result<Vec<Item>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE platform = ? AND (conversation_id = ? OR id = ?)
             ORDER BY created_at ASC, id ASC"
        );
        self.query_items(
            &sql,
            vec![
                Value::from(self.platform.as_str()),
                Value::from(conversation_id),
                Value::from(conversation_id),
            ],
        )
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE platform = ? AND id = ?");
        let items = self
            .query_items(
                &sql,
                vec![Value::from(self.platform.as_str()), Value::from(id)],
            )
            .await?;
        Ok(items.into_iter().next())
    }

    async fn count_top_level(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM items WHERE platform = ? AND is_referenced = 0",
                [self.platform.as_str()],
            )
            .await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn record_run(&self, run: &SyncRunRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sync_runs (platform, finished_at, stop_reason, new_items, persisted_items)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    self.platform.as_str(),
                    run.finished_at,
                    run.stop_reason.as_str(),
                    run.new_items,
                    run.persisted_items,
                ],
            )
            .await?;
        Ok(())
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<SyncRunRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT finished_at, stop_reason, new_items, persisted_items
                 FROM sync_runs
                 WHERE platform = ?
                 ORDER BY finished_at DESC, id DESC
                 LIMIT ?",
                vec![
                    Value::from(self.platform.as_str()),
                    Value::Integer(limit as i64),
                ],
            )
            .await?;

        let mut runs = Vec::new();
        while let Some(row) = rows.next().await? {
            runs.push(SyncRunRecord {
                platform: self.platform,
                finished_at: row.get(0)?,
                stop_reason: row.get(1)?,
                new_items: row.get(2)?,
                persisted_items: row.get(3)?,
            });
        }
        Ok(runs)
    }
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

/// Parse an item from a row selected with `ITEM_COLUMNS`
fn parse_item(row: &Row) -> Result<Item> {
    let platform: String = row.get(0)?;
    let url = match row.get_value(8)? {
        Value::Text(url) => Some(url),
        _ => None,
    };

    Ok(Item {
        platform: platform
            .parse()
            .map_err(|_| Error::Database(format!("unknown platform '{platform}' in items")))?,
        id: row.get(1)?,
        author_id: row.get(2)?,
        conversation_id: row.get(3)?,
        created_at: row.get(4)?,
        rank: row.get(5)?,
        is_referenced: row.get::<i64>(6)? != 0,
        text: row.get(7)?,
        url,
    })
}
