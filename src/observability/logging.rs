//! # Structured Logging
//!
//! Subscriber setup plus the storage span macro.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the configured
//! log level. JSON output is intended for log shippers; the default is the
//! human-readable formatter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Debug span around one storage statement.
///
/// ```rust,ignore
/// future.instrument(db_span!("posts.feed", limit = 20)).await
/// ```
#[macro_export]
macro_rules! db_span {
    ($operation:expr) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let installed = if config.json_logs {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|e| Error::config(format!("Failed to initialize logging: {}", e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        server_address = %config.bind_address(),
        database_url = %crate::storage::pool::sanitize_url(&config.database.url),
        rate_limit_enabled = config.rate_limit.enabled,
        rate_limit_requests = config.rate_limit.max_requests,
        rate_limit_window_seconds = config.rate_limit.window_seconds,
        cache_enabled = config.cache.enabled,
        metrics_enabled = config.observability.enable_metrics,
        "Social feed configuration"
    );

    if config.uses_development_secret() {
        tracing::warn!("Using the built-in development session secret; set SOCIALFEED_AUTH_TOKEN_SECRET");
    }
}
