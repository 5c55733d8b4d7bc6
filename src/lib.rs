//! Tagmark — a personal bookmark manager core.
//!
//! Tag-aware bookmark search over SQLite, plus the transactional pipeline that
//! stores bookmarks together with their tags. This library crate exposes all
//! modules for use by the RPC binary and integration tests.

pub mod app;
pub mod database;
pub mod logging;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
pub mod url_utils;
