//! Fixed-window rate limiting for every inbound request.
//!
//! Each client identity gets a counter the first time it is seen. The window
//! is anchored to that first request: a detached task removes the counter
//! exactly `window` later no matter how much traffic arrives in between.
//!
//! # Configuration
//!
//! - `SOCIALFEED_RATELIMITER_ENABLED`: gate on/off (default: true)
//! - `SOCIALFEED_RATELIMITER_REQUEST_COUNT`: requests per window (default: 20)
//! - `SOCIALFEED_RATELIMITER_WINDOW_SECONDS`: window length (default: 5)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::config::RateLimitConfig;
use crate::observability::metrics;

const FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Debug)]
struct Window {
    count: u32,
    generation: u64,
}

#[derive(Debug, Default)]
struct Windows {
    by_identity: HashMap<String, Window>,
    next_generation: u64,
}

/// Per-identity fixed-window counter.
///
/// All reads, increments, inserts and expiry deletions go through the same
/// mutex. Expiry tasks only delete the window generation they were spawned
/// for, so a late-running task can never wipe a window opened after it.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<Windows>>,
    max_requests: u32,
    window: Duration,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(Windows::default())),
            max_requests,
            window,
            enabled: true,
        }
    }

    /// A limiter that admits everything.
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::new(u32::MAX, Duration::ZERO) }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        if config.enabled {
            Self::new(config.max_requests, config.window())
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide whether `identity` may proceed.
    ///
    /// Returns `(true, ZERO)` when admitted. On rejection the retry hint is the
    /// full configured window, since the remaining time is not tracked.
    /// Must be called from within a Tokio runtime.
    pub async fn admit(&self, identity: &str) -> (bool, Duration) {
        if !self.enabled {
            return (true, Duration::ZERO);
        }

        let mut windows = self.windows.lock().await;
        let state = &mut *windows;

        if !state.by_identity.contains_key(identity) {
            let generation = state.next_generation;
            state.next_generation = state.next_generation.wrapping_add(1);
            state.by_identity.insert(identity.to_string(), Window { count: 0, generation });
            self.schedule_expiry(identity.to_string(), generation);
        }

        let Some(window) = state.by_identity.get_mut(identity) else {
            return (true, Duration::ZERO);
        };

        if window.count < self.max_requests {
            window.count += 1;
            debug!(
                identity = %identity,
                count = window.count,
                max_requests = self.max_requests,
                "Rate limit check passed"
            );
            (true, Duration::ZERO)
        } else {
            warn!(
                identity = %identity,
                retry_after_seconds = self.window.as_secs(),
                "Rate limit exceeded"
            );
            (false, self.window)
        }
    }

    fn schedule_expiry(&self, identity: String, generation: u64) {
        let windows = Arc::clone(&self.windows);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut windows = windows.lock().await;
            if windows.by_identity.get(&identity).map(|w| w.generation) == Some(generation) {
                windows.by_identity.remove(&identity);
                debug!(identity = %identity, "Rate limit window expired");
            }
        });
    }

    #[cfg(test)]
    async fn tracked_identities(&self) -> usize {
        self.windows.lock().await.by_identity.len()
    }
}

/// Derive the client identity: first `X-Forwarded-For` entry when present,
/// otherwise the peer address without its port.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(first) = headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return first.to_string();
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

/// Axum middleware applying the rate gate ahead of every route.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if !limiter.is_enabled() {
        return Ok(next.run(request).await);
    }

    let peer = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0);
    let identity = client_identity(request.headers(), peer);

    let (allowed, retry_after) = limiter.admit(&identity).await;
    metrics::record_rate_limit_decision(allowed);

    if !allowed {
        return Err(ApiError::TooManyRequests { retry_after });
    }

    Ok(next.run(request).await)
}
