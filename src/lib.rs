//! # Socialfeed
//!
//! Backend core of a small social network: accounts with email-verified
//! registration, sessions, a follow graph, posts with comments and a
//! personalised feed.
//!
//! ## Architecture
//!
//! ```text
//! HTTP (axum) → rate gate → session gate → handlers → repositories (sqlx/PostgreSQL)
//!                               ↓
//!                     identity resolution ← user cache (Redis or in-process)
//! ```
//!
//! Every inbound request passes the rate gate. Authenticated routes then
//! validate the bearer session, resolve the acting user through the cache
//! and, for post mutation, check ownership and role precedence.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod storage;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
