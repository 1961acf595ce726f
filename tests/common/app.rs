//! Full router over in-memory repositories, driven with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use socialfeed::api::{build_router, ApiState, RateLimiter};
use socialfeed::auth::{AccessPipeline, Authenticator, LoginService, RegistrationService, User};
use socialfeed::cache::UserCache;

use super::memory::MemoryStore;

pub const SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
pub const ISSUER: &str = "socialfeed";
pub const AUDIENCE: &str = "socialfeed";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub authenticator: Arc<Authenticator>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(RateLimiter::disabled(), None)
    }

    pub fn with_rate_limit(max_requests: u32, window: Duration) -> Self {
        Self::build(RateLimiter::new(max_requests, window), None)
    }

    pub fn with_cache(cache: Arc<dyn UserCache>) -> Self {
        Self::build(RateLimiter::disabled(), Some(cache))
    }

    fn build(limiter: RateLimiter, cache: Option<Arc<dyn UserCache>>) -> Self {
        let store = Arc::new(MemoryStore::seeded());
        let authenticator =
            Arc::new(Authenticator::new(SECRET, ISSUER, AUDIENCE, Duration::from_secs(3600)));

        let mut access = AccessPipeline::new(authenticator.clone(), store.clone(), store.clone());
        if let Some(cache) = cache {
            access = access.with_cache(cache, Duration::from_secs(60));
        }

        let state = ApiState {
            registration: Arc::new(RegistrationService::new(
                store.clone(),
                Duration::from_secs(3 * 24 * 3600),
            )),
            login: Arc::new(LoginService::new(store.clone(), authenticator.clone())),
            access: Arc::new(access),
            follows: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
        };

        let router = build_router(state, Arc::new(limiter), false);
        Self { router, store, authenticator }
    }

    pub fn token_for(&self, user: &User) -> String {
        let claims = self.authenticator.claims_for(user.id);
        self.authenticator.issue(&claims).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send and decode the JSON envelope.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send(request(method, uri, token, body)).await;
        let status = response.status();
        (status, read_json(response).await)
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
