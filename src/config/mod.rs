//! # Configuration Management
//!
//! Environment-driven configuration for the social feed backend.

pub mod settings;

pub use settings::{
    AppConfig, AuthConfig, CacheConfig, DatabaseConfig, ObservabilityConfig, RateLimitConfig,
    ServerConfig, ENV_PREFIX,
};
