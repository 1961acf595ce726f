//! Post CRUD handlers.
//!
//! Updating a post requires owning it and holding at least the moderator
//! role; deleting requires ownership and the admin role.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::api::routes::ApiState;
use crate::auth::{ActingUser, Role};
use crate::domain::{NewPost, Post, PostId, PostPatch};
use crate::errors::Error;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostBody {
    #[validate(length(min = 1, max = 100, message = "title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 1000, message = "content must be between 1 and 1000 characters"))]
    pub content: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePostBody {
    #[validate(length(min = 1, max = 100, message = "title must be between 1 and 100 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 1000, message = "content must be between 1 and 1000 characters"))]
    pub content: Option<String>,
}

impl From<UpdatePostBody> for PostPatch {
    fn from(body: UpdatePostBody) -> Self {
        PostPatch { title: body.title, content: body.content }
    }
}

#[instrument(skip(state, actor, payload), fields(user_id = %actor.user().id))]
pub async fn create_post_handler(
    State(state): State<ApiState>,
    Extension(actor): Extension<ActingUser>,
    Json(payload): Json<CreatePostBody>,
) -> Result<(StatusCode, Json<ApiResponse<Post>>), ApiError> {
    payload.validate().map_err(Error::from)?;

    let tags = payload
        .tags
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();

    let post = state
        .posts
        .create(NewPost {
            user_id: actor.user().id,
            title: payload.title,
            content: payload.content,
            tags,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::with_data("Post created successfully", post))))
}

#[instrument(skip(state), fields(post_id = %post_id))]
pub async fn show_post_handler(
    State(state): State<ApiState>,
    Path(post_id): Path<PostId>,
) -> Result<Json<ApiResponse<Post>>, ApiError> {
    let mut post = state.posts.get_by_id(post_id).await?;
    post.comments = state.comments.get_by_post_id(post_id).await?;

    Ok(Json(ApiResponse::with_data("Post retrieved successfully", post)))
}

#[instrument(skip(state, actor, payload), fields(user_id = %actor.user().id, post_id = %post_id))]
pub async fn update_post_handler(
    State(state): State<ApiState>,
    Extension(actor): Extension<ActingUser>,
    Path(post_id): Path<PostId>,
    Json(payload): Json<UpdatePostBody>,
) -> Result<Json<ApiResponse<Post>>, ApiError> {
    payload.validate().map_err(Error::from)?;

    let post = state.posts.get_by_id(post_id).await?;
    state.access.authorize_owner(actor.user(), post.user_id, Role::MODERATOR).await?;

    let patch = PostPatch::from(payload);
    let post = if patch.is_empty() { post } else { state.posts.update(post_id, &patch).await? };

    Ok(Json(ApiResponse::with_data("Post updated successfully", post)))
}

#[instrument(skip(state, actor), fields(user_id = %actor.user().id, post_id = %post_id))]
pub async fn delete_post_handler(
    State(state): State<ApiState>,
    Extension(actor): Extension<ActingUser>,
    Path(post_id): Path<PostId>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let post = state.posts.get_by_id(post_id).await?;
    state.access.authorize_owner(actor.user(), post.user_id, Role::ADMIN).await?;

    state.posts.delete(post_id).await?;
    Ok(Json(ApiResponse::message("Post deleted successfully")))
}
