//! Incremental bookmark synchronization.
//!
//! One [`SyncCoordinator`] per platform walks the remote listing page by page
//! through a [`Paginator`], stamps ranks with an [`OrderAssigner`] before any
//! fan-out, persists each item as its own task and backfills the threads of
//! newly discovered items through a [`ThreadBackfiller`].

mod backfill;
mod coordinator;
mod order;
mod paginator;
mod policy;
mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use backfill::ThreadBackfiller;
pub use coordinator::{SyncCoordinator, SyncOutcome, SyncReport};
pub use order::{OrderAssigner, ReferenceRanks, SyncCursor};
pub use paginator::{
    BoundaryMode, ListingFetcher, PageFetcher, PagedItem, Paginator, StopReason, ThreadFetcher,
};
pub use policy::{SyncPolicy, DEFAULT_LATEST_RANK, MAX_PAGE_SIZE, RANK_BUFFER};
pub use source::{BookmarkSink, BookmarkSource, Page};
