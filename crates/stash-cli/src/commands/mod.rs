pub mod auth;
pub mod common;
pub mod config;
pub mod list;
pub mod status;
pub mod sync;
pub mod thread;
