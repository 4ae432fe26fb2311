//! Conversation backfill for newly discovered items.

use std::sync::Arc;

use crate::models::Item;
use crate::Result;

use super::{
    BookmarkSink, BookmarkSource, PagedItem, Paginator, ReferenceRanks, ThreadFetcher,
};

/// Fetches and stores every item of a conversation as referenced rows
pub struct ThreadBackfiller<S, L> {
    source: Arc<S>,
    sink: Arc<L>,
    ranks: Arc<ReferenceRanks>,
}

impl<S: BookmarkSource, L: BookmarkSink> ThreadBackfiller<S, L> {
    pub const fn new(source: Arc<S>, sink: Arc<L>, ranks: Arc<ReferenceRanks>) -> Self {
        Self {
            source,
            sink,
            ranks,
        }
    }

    /// Walk `root`'s conversation until the remote runs out of pages.
    ///
    /// Returns the number of new rows stored, or `None` if the walk failed.
    /// Failures are logged here and never reach the caller; pages stored
    /// before the failure stay stored.
    pub async fn backfill(&self, access_token: &str, root: &Item) -> Option<usize> {
        match self.walk(access_token, root).await {
            Ok(persisted) => {
                tracing::debug!(
                    conversation = %root.conversation_id,
                    persisted,
                    "Backfilled thread"
                );
                Some(persisted)
            }
            Err(error) => {
                tracing::warn!(
                    conversation = %root.conversation_id,
                    "Thread backfill failed: {}",
                    error
                );
                None
            }
        }
    }

    async fn walk(&self, access_token: &str, root: &Item) -> Result<usize> {
        let fetcher = ThreadFetcher::new(
            self.source.as_ref(),
            access_token,
            &root.author_id,
            &root.conversation_id,
        );
        let mut pages = Paginator::new(fetcher);

        let mut persisted = 0;
        while let Some(page) = pages.next_page().await {
            for PagedItem { mut graph, .. } in page? {
                // Already stored as a top-level item.
                if graph.id() == root.id {
                    continue;
                }
                graph.mark_referenced();
                graph.root.rank = self.ranks.next_rank();
                self.ranks.stamp(&mut graph.referenced);
                persisted += self.sink.insert_graph(&graph).await?;
            }
        }
        Ok(persisted)
    }
}
