//! Shared services used across front ends.

mod bookmarks;

pub use bookmarks::{BookmarkStore, TopLevelPages};
