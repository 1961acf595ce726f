use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug_span, Span};

use crate::api::rate_limit::{enforce_rate_limit, RateLimiter};
use crate::auth::{middleware::authenticate, AccessPipeline, LoginService, RegistrationService};
use crate::storage::{CommentRepository, FollowRepository, PostRepository};

use super::handlers::{
    activate_handler, create_post_handler, delete_post_handler, feed_handler, follow_handler,
    get_user_handler, health_handler, login_handler, register_handler, show_post_handler,
    unfollow_handler, update_post_handler,
};

/// Services and repositories shared by every handler.
#[derive(Clone)]
pub struct ApiState {
    pub registration: Arc<RegistrationService>,
    pub login: Arc<LoginService>,
    pub access: Arc<AccessPipeline>,
    pub follows: Arc<dyn FollowRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

/// Assemble the `/v1` API. The rate gate wraps every route, public ones
/// included; the session gate wraps only the authenticated ones.
pub fn build_router(state: ApiState, limiter: Arc<RateLimiter>, enable_cors: bool) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.access.clone(), authenticate);

    let public = Router::new()
        .route("/v1/health", get(health_handler))
        .route("/v1/register", post(register_handler))
        .route("/v1/login", post(login_handler))
        .route("/v1/users/activate/{token}", put(activate_handler));

    let secured = Router::new()
        .route("/v1/users/feed", get(feed_handler))
        .route("/v1/users/{user_id}", get(get_user_handler))
        .route("/v1/users/{user_id}/follow", put(follow_handler))
        .route("/v1/users/{user_id}/unfollow", put(unfollow_handler))
        .route("/v1/post/create", post(create_post_handler))
        .route("/v1/post/{post_id}/show", get(show_post_handler))
        .route("/v1/post/{post_id}/update", patch(update_post_handler))
        .route("/v1/post/{post_id}/delete", delete(delete_post_handler))
        .route_layer(auth_layer);

    let router = public
        .merge(secured)
        .with_state(state)
        .layer(middleware::from_fn_with_state(limiter, enforce_rate_limit))
        .layer(TraceLayer::new_for_http().make_span_with(make_span));

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
            .allow_headers(Any)
            .allow_origin(Any);
        router.layer(cors)
    } else {
        router
    }
}

fn make_span(request: &Request<Body>) -> Span {
    debug_span!("http-request", method = %request.method(), path = request.uri().path())
}
