//! Rank assignment.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::models::Item;

/// High-water mark read from the store when a run starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCursor {
    pub latest_known_id: Option<String>,
    pub latest_known_rank: i64,
}

impl SyncCursor {
    /// Cursor for a store whose newest top-level item is `latest`
    #[must_use]
    pub fn from_latest(latest: Option<&Item>, default_rank: i64) -> Self {
        match latest {
            Some(item) => Self {
                latest_known_id: Some(item.id.clone()),
                latest_known_rank: item.rank,
            },
            None => Self {
                latest_known_id: None,
                latest_known_rank: default_rank,
            },
        }
    }
}

/// Hands out top-level ranks for one run, highest first.
///
/// Starts at `latest_known_rank + window` and counts down, so every rank it
/// returns is strictly above `latest_known_rank`. Not synchronized: call it
/// from the sequential pre-pass only.
#[derive(Debug)]
pub struct OrderAssigner {
    next: i64,
    remaining: usize,
}

impl OrderAssigner {
    #[must_use]
    pub fn new(cursor: &SyncCursor, window: usize) -> Self {
        let span = i64::try_from(window).unwrap_or(i64::MAX);
        Self {
            next: cursor.latest_known_rank.saturating_add(span),
            remaining: window,
        }
    }

    /// Next rank, or `None` once the reserved window is used up
    pub fn next_rank(&mut self) -> Option<i64> {
        if self.remaining == 0 {
            return None;
        }
        let rank = self.next;
        self.next -= 1;
        self.remaining -= 1;
        Some(rank)
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }
}

/// Ranks for referenced rows (quoted posts, backfilled thread items)
///
/// Counts down from just below the run's `latest_known_rank`, so referenced
/// rows never share a rank with the main walk or with each other. Shared by
/// concurrently running backfills.
#[derive(Debug)]
pub struct ReferenceRanks {
    next: AtomicI64,
}

impl ReferenceRanks {
    #[must_use]
    pub fn below(latest_known_rank: i64) -> Self {
        Self {
            next: AtomicI64::new(latest_known_rank - 1),
        }
    }

    pub fn next_rank(&self) -> i64 {
        self.next.fetch_sub(1, Ordering::Relaxed)
    }

    /// Give each item its own rank, in slice order
    pub fn stamp(&self, items: &mut [Item]) {
        for item in items {
            item.rank = self.next_rank();
        }
    }
}
