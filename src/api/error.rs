use std::time::Duration;

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::auth::models::AuthError;
use crate::errors::Error;

const UNAUTHORIZED: &str = "unauthorized";
const FORBIDDEN: &str = "forbidden";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    TooManyRequests { retry_after: Duration },
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(UNAUTHORIZED.to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden(FORBIDDEN.to_string())
    }

    pub fn service_unavailable<S: Into<String>>(msg: S) -> Self {
        ApiError::ServiceUnavailable(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        ApiError::Internal(msg.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: bool,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        let (message, retry_after) = match self {
            ApiError::TooManyRequests { retry_after } => {
                ("too many requests".to_string(), Some(retry_after))
            }
            ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Internal(msg) => (msg, None),
        };

        let mut response = (status, Json(ErrorBody { status: false, message })).into_response();

        if let Some(retry_after) = retry_after {
            // Whole seconds, rounded up so a client never retries early.
            let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation { message, .. } => ApiError::BadRequest(message),
            Error::NotFound { resource_type, .. } => {
                ApiError::NotFound(format!("{} not found", resource_type))
            }
            Error::Conflict { kind } => ApiError::Conflict(kind.message().to_string()),
            Error::Unauthenticated { .. } => ApiError::unauthorized(),
            Error::Forbidden { .. } => ApiError::forbidden(),
            Error::RateLimited { retry_after } => ApiError::TooManyRequests { retry_after },
            Error::Unavailable { operation } => {
                error!(operation = %operation, "dependency unavailable");
                ApiError::service_unavailable("service temporarily unavailable")
            }
            err @ (Error::Config { .. } | Error::Database { .. } | Error::Internal { .. }) => {
                error!(error = %err, "request failed with internal error");
                ApiError::internal("internal server error")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        crate::auth::middleware::map_auth_error(err)
    }
}
