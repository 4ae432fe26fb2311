//! Lazy page-by-page walk over a remote listing.

use std::fmt;
use std::future::Future;

use crate::models::ItemGraph;
use crate::Result;

use super::{BookmarkSource, Page};

/// Fetches one page given the previous continuation token
pub trait PageFetcher {
    fn fetch(&self, continuation: Option<&str>) -> impl Future<Output = Result<Page>> + Send;
}

/// A platform's saved-item listing, bound to one account
pub struct ListingFetcher<'a, S> {
    source: &'a S,
    access_token: &'a str,
    account_id: &'a str,
    page_size: usize,
}

impl<'a, S: BookmarkSource> ListingFetcher<'a, S> {
    pub const fn new(
        source: &'a S,
        access_token: &'a str,
        account_id: &'a str,
        page_size: usize,
    ) -> Self {
        Self {
            source,
            access_token,
            account_id,
            page_size,
        }
    }
}

impl<S: BookmarkSource> PageFetcher for ListingFetcher<'_, S> {
    async fn fetch(&self, continuation: Option<&str>) -> Result<Page> {
        self.source
            .fetch_page(self.access_token, self.account_id, continuation, self.page_size)
            .await
    }
}

/// One conversation of a platform, as seen by one author
pub struct ThreadFetcher<'a, S> {
    source: &'a S,
    access_token: &'a str,
    author_id: &'a str,
    conversation_id: &'a str,
}

impl<'a, S: BookmarkSource> ThreadFetcher<'a, S> {
    pub const fn new(
        source: &'a S,
        access_token: &'a str,
        author_id: &'a str,
        conversation_id: &'a str,
    ) -> Self {
        Self {
            source,
            access_token,
            author_id,
            conversation_id,
        }
    }
}

impl<S: BookmarkSource> PageFetcher for ThreadFetcher<'_, S> {
    async fn fetch(&self, continuation: Option<&str>) -> Result<Page> {
        self.source
            .fetch_thread(
                self.access_token,
                self.author_id,
                self.conversation_id,
                continuation,
            )
            .await
    }
}

/// What to do on reaching the previously newest known item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMode {
    /// Stop the walk; the known item and everything after it are not emitted.
    StopWalk,
    /// Keep walking, but emit the known item and everything after it as not new.
    GateBackfillOnly,
}

/// Why a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The remote returned no continuation token (or an empty page)
    Exhausted,
    /// The item ceiling was reached
    Ceiling,
    /// The previously newest known item was reached
    Boundary,
    /// A page fetch failed
    Failed,
}

impl StopReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::Ceiling => "ceiling",
            Self::Boundary => "boundary",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// An emitted item and whether it lies before the known boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedItem {
    pub graph: ItemGraph,
    pub is_new: bool,
}

struct Boundary {
    id: String,
    mode: BoundaryMode,
    crossed: bool,
}

/// Finite, non-restartable sequence of pages
///
/// Stopping rules are checked after every page, first match wins: no
/// continuation token, item ceiling reached, boundary reached (`StopWalk`
/// only). A fetch error is yielded once and ends the sequence.
pub struct Paginator<F> {
    fetcher: F,
    continuation: Option<String>,
    ceiling: Option<usize>,
    boundary: Option<Boundary>,
    items_fetched: usize,
    pages_fetched: usize,
    stop_reason: Option<StopReason>,
}

impl<F: PageFetcher> Paginator<F> {
    pub const fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            continuation: None,
            ceiling: None,
            boundary: None,
            items_fetched: 0,
            pages_fetched: 0,
            stop_reason: None,
        }
    }

    /// Emit at most `ceiling` items in total
    #[must_use]
    pub fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Treat `id` as the previously newest known item
    #[must_use]
    pub fn with_boundary(mut self, id: impl Into<String>, mode: BoundaryMode) -> Self {
        self.boundary = Some(Boundary {
            id: id.into(),
            mode,
            crossed: false,
        });
        self
    }

    /// Resume from a continuation token instead of the first page
    #[must_use]
    pub fn starting_at(mut self, continuation: impl Into<String>) -> Self {
        self.continuation = Some(continuation.into());
        self
    }

    /// Fetch and filter the next page; `None` once the walk has stopped
    pub async fn next_page(&mut self) -> Option<Result<Vec<PagedItem>>> {
        if self.stop_reason.is_some() {
            return None;
        }

        let page = match self.fetcher.fetch(self.continuation.as_deref()).await {
            Ok(page) => page,
            Err(error) => {
                self.stop_reason = Some(StopReason::Failed);
                return Some(Err(error));
            }
        };
        self.pages_fetched += 1;

        let exhausted = page.next_token.is_none() || page.items.is_empty();
        let mut graphs = page.items;

        let mut hit_ceiling = false;
        if let Some(ceiling) = self.ceiling {
            let remaining = ceiling.saturating_sub(self.items_fetched);
            if graphs.len() >= remaining {
                graphs.truncate(remaining);
                hit_ceiling = true;
            }
        }

        let mut hit_boundary = false;
        let mut emitted = Vec::with_capacity(graphs.len());
        for graph in graphs {
            let mut is_new = true;
            if let Some(boundary) = self.boundary.as_mut() {
                if !boundary.crossed && graph.id() == boundary.id {
                    boundary.crossed = true;
                }
                if boundary.crossed {
                    if boundary.mode == BoundaryMode::StopWalk {
                        hit_boundary = true;
                        break;
                    }
                    is_new = false;
                }
            }
            emitted.push(PagedItem { graph, is_new });
        }
        self.items_fetched += emitted.len();
        self.continuation = page.next_token;

        tracing::debug!(
            page = self.pages_fetched,
            items = emitted.len(),
            total = self.items_fetched,
            "Fetched listing page"
        );

        self.stop_reason = if exhausted {
            Some(StopReason::Exhausted)
        } else if hit_ceiling {
            Some(StopReason::Ceiling)
        } else if hit_boundary {
            Some(StopReason::Boundary)
        } else {
            None
        };

        Some(Ok(emitted))
    }

    /// Why the walk ended, once it has
    pub const fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub const fn items_fetched(&self) -> usize {
        self.items_fetched
    }

    pub const fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}
