//! Per-platform sync tuning.

use crate::models::Platform;

use super::BoundaryMode;

/// Largest page either listing API accepts
pub const MAX_PAGE_SIZE: usize = 100;

/// Ranks reserved above the latest known rank for each run
pub const RANK_BUFFER: usize = 250;

/// Rank the store is assumed to hold when it is still empty
pub const DEFAULT_LATEST_RANK: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    pub page_size: usize,
    /// Hard ceiling on items fetched per run
    pub max_items: usize,
    pub rank_buffer: usize,
    pub default_latest_rank: i64,
    pub boundary: BoundaryMode,
    pub backfill_threads: bool,
}

impl SyncPolicy {
    /// Stop the walk at the previously newest bookmark, 250 items at most.
    #[must_use]
    pub const fn twitter() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_items: 250,
            rank_buffer: RANK_BUFFER,
            default_latest_rank: DEFAULT_LATEST_RANK,
            boundary: BoundaryMode::StopWalk,
            backfill_threads: true,
        }
    }

    /// Walk up to 800 saved items; the known boundary only gates backfill.
    ///
    /// The rank window follows the 800 ceiling, so a first sync on an empty
    /// store ranks from 1800 down rather than from 1250.
    #[must_use]
    pub const fn reddit() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_items: 800,
            rank_buffer: RANK_BUFFER,
            default_latest_rank: DEFAULT_LATEST_RANK,
            boundary: BoundaryMode::GateBackfillOnly,
            backfill_threads: true,
        }
    }

    #[must_use]
    pub const fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Twitter => Self::twitter(),
            Platform::Reddit => Self::reddit(),
        }
    }

    /// Number of ranks the main walk reserves above the latest known rank.
    ///
    /// Never smaller than the ceiling, so every fetched item gets a rank.
    #[must_use]
    pub fn rank_window(&self) -> usize {
        self.rank_buffer.max(self.max_items)
    }
}
