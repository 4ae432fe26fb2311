//! Database layer for Stash

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{BookmarkRepository, LibSqlBookmarkRepository, SyncRunRecord};
