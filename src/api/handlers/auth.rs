//! Registration, activation and login handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::instrument;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::api::routes::ApiState;
use crate::auth::{LoginRequest, RegisterUserRequest, User};

#[derive(Debug, Serialize)]
pub struct RegistrationData {
    pub token: String,
    pub user: User,
}

#[instrument(skip(state, payload))]
pub async fn register_handler(
    State(state): State<ApiState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegistrationData>>), ApiError> {
    let registration = state.registration.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data(
            "User registered successfully",
            RegistrationData { token: registration.token, user: registration.user },
        )),
    ))
}

#[instrument(skip(state, token))]
pub async fn activate_handler(
    State(state): State<ApiState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.registration.activate(&token).await?;
    Ok(Json(ApiResponse::message("Your email has been verified")))
}

#[instrument(skip(state, payload))]
pub async fn login_handler(
    State(state): State<ApiState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let session = state.login.login(payload).await?;
    Ok(Json(ApiResponse::with_token("Welcome back", session.token, session.user)))
}
