use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::rate_limit::RateLimiter;
use crate::api::routes::{build_router, ApiState};
use crate::auth::{AccessPipeline, Authenticator, LoginService, RegistrationService};
use crate::cache::UserCache;
use crate::config::AppConfig;
use crate::errors::{Error, Result};
use crate::storage::{
    DbPool, SqlxCommentRepository, SqlxFollowRepository, SqlxPostRepository, SqlxRoleRepository,
    SqlxUserRepository,
};

impl ApiState {
    /// Wire every service against PostgreSQL, with an optional user cache in
    /// front of identity resolution.
    pub fn with_sqlx(pool: DbPool, config: &AppConfig, cache: Option<Arc<dyn UserCache>>) -> Self {
        let query_timeout = config.database.query_timeout();
        let authenticator = Arc::new(Authenticator::from_config(&config.auth));

        let users = Arc::new(SqlxUserRepository::new(pool.clone()).with_query_timeout(query_timeout));
        let roles = Arc::new(SqlxRoleRepository::new(pool.clone()).with_query_timeout(query_timeout));

        let mut access = AccessPipeline::new(authenticator.clone(), users.clone(), roles);
        if let Some(cache) = cache {
            access = access.with_cache(cache, config.cache.ttl());
        }

        Self {
            registration: Arc::new(RegistrationService::new(
                users.clone(),
                config.auth.invitation_ttl(),
            )),
            login: Arc::new(LoginService::new(users, authenticator)),
            access: Arc::new(access),
            follows: Arc::new(
                SqlxFollowRepository::new(pool.clone()).with_query_timeout(query_timeout),
            ),
            posts: Arc::new(SqlxPostRepository::new(pool.clone()).with_query_timeout(query_timeout)),
            comments: Arc::new(SqlxCommentRepository::new(pool).with_query_timeout(query_timeout)),
        }
    }
}

/// Bind and serve until ctrl-c. Peer addresses are exposed to the rate
/// limiter through `ConnectInfo`.
pub async fn start_api_server(config: &AppConfig, state: ApiState) -> Result<()> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| Error::config(format!("Invalid API address: {}", e)))?;

    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
    if !limiter.is_enabled() {
        warn!("Rate limiting is disabled");
    }

    let router: Router = build_router(state, limiter, config.server.enable_cors);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::internal(format!("Failed to bind API server: {}", e)))?;

    info!(address = %addr, "Starting HTTP API server");

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "API server shutdown listener failed");
            }
        })
        .await
        .map_err(|e| Error::internal(format!("API server error: {}", e)))?;

    info!("API server shutdown completed");
    Ok(())
}
