use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use socialfeed::{
    api::{start_api_server, ApiState},
    cache::{RedisUserCache, UserCache},
    cli::Cli,
    observability::{init_observability, log_config_info},
    storage::create_pool,
    AppConfig, APP_NAME, VERSION,
};
use tracing::{info, warn};

/// Per-operation deadline for cache round trips.
const CACHE_OP_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(250);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (optional - won't fail if missing)
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("loading configuration")?;
    cli.apply(&mut config)?;
    config.validate_all().context("validating configuration")?;

    init_observability(&config.observability)?;
    info!(app_name = APP_NAME, version = VERSION, "Starting social feed API");
    log_config_info(&config);

    let pool = create_pool(&config.database).await.context("connecting to PostgreSQL")?;

    let cache: Option<Arc<dyn UserCache>> = if config.cache.enabled {
        match RedisUserCache::connect(&config.cache.redis_url, CACHE_OP_TIMEOUT).await {
            Ok(cache) => {
                info!("User cache connected");
                Some(Arc::new(cache))
            }
            Err(e) => {
                warn!(error = %e, "User cache unavailable at startup, continuing without it");
                None
            }
        }
    } else {
        None
    };

    let state = ApiState::with_sqlx(pool, &config, cache);
    start_api_server(&config, state).await?;

    Ok(())
}
