//! Capabilities the sync engine is generic over.

use std::future::Future;

use crate::models::{Item, ItemGraph, Platform};
use crate::Result;

/// One page of a remote listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<ItemGraph>,
    /// Continuation token; `None` once the listing is exhausted
    pub next_token: Option<String>,
}

impl Page {
    #[must_use]
    pub fn new(items: Vec<ItemGraph>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }
}

/// Remote side: a platform's saved-item listing and its conversation lookup
///
/// Implementations return `Error::Unauthorized` for HTTP 401 so the
/// coordinator can tell an expired token from any other failure.
pub trait BookmarkSource: Send + Sync + 'static {
    fn platform(&self) -> Platform;

    /// Fetch one page of the account's saved items
    fn fetch_page(
        &self,
        access_token: &str,
        account_id: &str,
        continuation: Option<&str>,
        page_size: usize,
    ) -> impl Future<Output = Result<Page>> + Send;

    /// Fetch one page of the items belonging to a conversation
    fn fetch_thread(
        &self,
        access_token: &str,
        author_id: &str,
        conversation_id: &str,
        continuation: Option<&str>,
    ) -> impl Future<Output = Result<Page>> + Send;
}

/// Local side: append-only persistence of item graphs
pub trait BookmarkSink: Send + Sync + 'static {
    /// Insert a graph, ignoring rows that already exist. Returns new item rows.
    fn insert_graph(&self, graph: &ItemGraph) -> impl Future<Output = Result<usize>> + Send;

    /// Highest-ranked stored item that is not merely referenced
    fn latest_top_level_item(&self) -> impl Future<Output = Result<Option<Item>>> + Send;
}
