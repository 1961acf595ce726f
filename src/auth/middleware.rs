//! Axum middleware for the session gate.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{field, info_span, warn, Instrument};

use crate::api::error::ApiError;
use crate::auth::access::AccessPipeline;
use crate::auth::models::{ActingUser, AuthError};

pub type AccessState = Arc<AccessPipeline>;

/// Authenticate the request and attach the resolved [`ActingUser`].
pub async fn authenticate(
    State(pipeline): State<AccessState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let correlation_id = uuid::Uuid::new_v4();
    let span = info_span!(
        "auth_middleware.authenticate",
        http.method = %request.method(),
        http.path = %request.uri().path(),
        user_id = field::Empty,
        correlation_id = %correlation_id
    );

    async move {
        let header = request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok());

        match pipeline.authenticate(header).await {
            Ok(user) => {
                tracing::Span::current().record("user_id", field::display(user.id));
                request.extensions_mut().insert(ActingUser(user));
                Ok(next.run(request).await)
            }
            Err(err) => {
                warn!(%correlation_id, error = %err, "authentication failed");
                Err(map_auth_error(err))
            }
        }
    }
    .instrument(span)
    .await
}

/// Callers never learn which check failed.
pub fn map_auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::MissingBearer
        | AuthError::MalformedBearer
        | AuthError::InvalidToken(_)
        | AuthError::UnknownSubject => ApiError::unauthorized(),
        AuthError::Forbidden => ApiError::forbidden(),
        AuthError::Persistence(inner) => ApiError::from(inner),
    }
}
