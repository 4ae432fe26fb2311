//! Data models for Stash

mod graph;
mod item;
mod platform;

pub use graph::ItemGraph;
pub use item::{Author, Item, ItemMetrics, MediaAttachment};
pub use platform::Platform;
