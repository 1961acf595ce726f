use axum::{
    extract::{Query, State},
    Extension, Json,
};
use tracing::instrument;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::api::routes::ApiState;
use crate::auth::ActingUser;
use crate::domain::{FeedItem, FeedParams, FeedQuery};

/// Posts by the acting user and the users they follow.
#[instrument(skip(state, actor, params), fields(user_id = %actor.user().id))]
pub async fn feed_handler(
    State(state): State<ApiState>,
    Extension(actor): Extension<ActingUser>,
    Query(params): Query<FeedParams>,
) -> Result<Json<ApiResponse<Vec<FeedItem>>>, ApiError> {
    let query = FeedQuery::try_from(params)?;
    let feed = state.posts.feed(actor.user().id, &query).await?;

    Ok(Json(ApiResponse::with_data("User feed retrieved successfully", feed)))
}
