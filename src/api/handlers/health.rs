//! Health check endpoint for monitoring and readiness probes

use axum::Json;
use serde::Serialize;

use crate::api::response::ApiResponse;

#[derive(Debug, Clone, Serialize)]
pub struct HealthData {
    pub version: &'static str,
}

/// Liveness probe. Does not touch the database.
pub async fn health_handler() -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse::with_data("ok", HealthData { version: crate::VERSION }))
}
