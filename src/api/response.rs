//! Success envelope shared by every handler.

use serde::Serialize;

/// `{status, message, token?, data?}`. Errors use the same shape with
/// `status: false`, see [`crate::api::error::ApiError`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn with_data<S: Into<String>>(message: S, data: T) -> Self {
        Self { status: true, message: message.into(), token: None, data: Some(data) }
    }

    pub fn with_token<S: Into<String>>(message: S, token: String, data: T) -> Self {
        Self { status: true, message: message.into(), token: Some(token), data: Some(data) }
    }
}

impl ApiResponse<()> {
    pub fn message<S: Into<String>>(message: S) -> Self {
        Self { status: true, message: message.into(), token: None, data: None }
    }
}
