//! stash-core - Core library for Stash
//!
//! This crate contains the models, local bookmark store, credential handling
//! and the incremental sync engine shared by every Stash front end, together
//! with the Twitter/X and Reddit listing clients the engine pulls from.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod platforms;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Author, Item, ItemGraph, ItemMetrics, MediaAttachment, Platform};
