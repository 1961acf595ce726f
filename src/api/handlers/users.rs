//! User lookup and follow-graph handlers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use tracing::instrument;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::api::routes::ApiState;
use crate::auth::{ActingUser, User};
use crate::domain::UserId;

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: User,
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_user_handler(
    State(state): State<ApiState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let user = state.access.resolve_user(user_id).await?;
    Ok(Json(ApiResponse::with_data("User retrieved successfully", UserData { user })))
}

#[instrument(skip(state, actor), fields(follower_id = %actor.user().id, followed_id = %user_id))]
pub async fn follow_handler(
    State(state): State<ApiState>,
    Extension(actor): Extension<ActingUser>,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.follows.follow(user_id, actor.user().id).await?;
    Ok(Json(ApiResponse::message("User followed successfully")))
}

#[instrument(skip(state, actor), fields(follower_id = %actor.user().id, followed_id = %user_id))]
pub async fn unfollow_handler(
    State(state): State<ApiState>,
    Extension(actor): Extension<ActingUser>,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.follows.unfollow(user_id, actor.user().id).await?;
    Ok(Json(ApiResponse::message("successful")))
}
