//! Manual migration runner for PostgreSQL
//!
//! Connects to a PostgreSQL database and runs all pending migrations.
//! Usage: cargo run --bin run_migrations
//!
//! Reads SOCIALFEED_DATABASE_URL like the server does.

use anyhow::Context;
use socialfeed::{
    config::AppConfig,
    storage::{create_pool, get_migration_version, run_migrations},
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let mut db_config = AppConfig::from_env().context("loading configuration")?.database;
    db_config.max_connections = 5;
    db_config.auto_migrate = false;

    let pool = create_pool(&db_config).await.context("connecting to PostgreSQL")?;
    info!("Connected to database");

    run_migrations(&pool).await?;

    let tables = sqlx::query_scalar::<_, String>(
        "SELECT tablename FROM pg_tables WHERE schemaname = 'public' ORDER BY tablename",
    )
    .fetch_all(&pool)
    .await?;
    info!(?tables, "Tables in database");

    if let Some(version) = get_migration_version(&pool).await? {
        info!(version, "Migration completed successfully");
    }

    Ok(())
}
