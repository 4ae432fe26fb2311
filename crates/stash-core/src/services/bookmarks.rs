//! Shared bookmark store used by the sync engine and the read side.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{BookmarkRepository, Database, LibSqlBookmarkRepository, SyncRunRecord};
use crate::models::{Item, ItemGraph, Platform};
use crate::sync::BookmarkSink;
use crate::Result;

/// Thread-safe, platform-scoped handle on the local database.
///
/// Clones share one connection; stores for different platforms can share a
/// database through [`BookmarkStore::for_platform`].
#[derive(Clone)]
pub struct BookmarkStore {
    db: Arc<Mutex<Database>>,
    platform: Platform,
}

impl BookmarkStore {
    /// Open (or create) the database file at `db_path`.
    pub async fn open_path(db_path: impl Into<PathBuf>, platform: Platform) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening bookmark database at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self::new(Arc::new(Mutex::new(db)), platform))
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory(platform: Platform) -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::new(Arc::new(Mutex::new(db)), platform))
    }

    pub fn new(db: Arc<Mutex<Database>>, platform: Platform) -> Self {
        Self { db, platform }
    }

    /// Same database, different platform
    #[must_use]
    pub fn for_platform(&self, platform: Platform) -> Self {
        Self::new(Arc::clone(&self.db), platform)
    }

    pub const fn platform(&self) -> Platform {
        self.platform
    }

    pub async fn insert_graph(&self, graph: &ItemGraph) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = LibSqlBookmarkRepository::new(db.connection(), self.platform);
        repo.insert_graph(graph).await
    }

    pub async fn latest_top_level_item(&self) -> Result<Option<Item>> {
        let db = self.db.lock().await;
        let repo = LibSqlBookmarkRepository::new(db.connection(), self.platform);
        repo.latest_top_level_item().await
    }

    pub async fn list_top_level(&self, limit: usize, offset: usize) -> Result<Vec<Item>> {
        let db = self.db.lock().await;
        let repo = LibSqlBookmarkRepository::new(db.connection(), self.platform);
        repo.list_top_level(limit, offset).await
    }

    /// Lazy reader over the top-level feed, `page_size` items at a time
    #[must_use]
    pub fn paged_top_level_items(&self, page_size: usize) -> TopLevelPages {
        TopLevelPages {
            store: self.clone(),
            page_size: page_size.max(1),
            offset: 0,
            done: false,
        }
    }

    pub async fn list_thread(&self, conversation_id: &str) -> Result<Vec<Item>> {
        let db = self.db.lock().await;
        let repo = LibSqlBookmarkRepository::new(db.connection(), self.platform);
        repo.list_thread(conversation_id).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Item>> {
        let db = self.db.lock().await;
        let repo = LibSqlBookmarkRepository::new(db.connection(), self.platform);
        repo.get(id).await
    }

    /// Number of top-level items
    pub async fn count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = LibSqlBookmarkRepository::new(db.connection(), self.platform);
        repo.count_top_level().await
    }

    pub async fn record_run(&self, run: &SyncRunRecord) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlBookmarkRepository::new(db.connection(), self.platform);
        repo.record_run(run).await
    }

    pub async fn recent_runs(&self, limit: usize) -> Result<Vec<SyncRunRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlBookmarkRepository::new(db.connection(), self.platform);
        repo.recent_runs(limit).await
    }
}

impl BookmarkSink for BookmarkStore {
    async fn insert_graph(&self, graph: &ItemGraph) -> Result<usize> {
        Self::insert_graph(self, graph).await
    }

    async fn latest_top_level_item(&self) -> Result<Option<Item>> {
        Self::latest_top_level_item(self).await
    }
}

/// Page-at-a-time reader over a store's top-level items, highest rank first
pub struct TopLevelPages {
    store: BookmarkStore,
    page_size: usize,
    offset: usize,
    done: bool,
}

impl TopLevelPages {
    /// Next page, or `None` after the last (possibly short) page
    pub async fn next_page(&mut self) -> Option<Result<Vec<Item>>> {
        if self.done {
            return None;
        }

        let page = match self.store.list_top_level(self.page_size, self.offset).await {
            Ok(page) => page,
            Err(error) => {
                self.done = true;
                return Some(Err(error));
            }
        };
        if page.len() < self.page_size {
            self.done = true;
        }
        if page.is_empty() {
            return None;
        }
        self.offset += page.len();
        Some(Ok(page))
    }

    /// Skip ahead to the page with the given zero-based index
    #[must_use]
    pub fn starting_at_page(mut self, page: usize) -> Self {
        self.offset = page * self.page_size;
        self
    }
}
