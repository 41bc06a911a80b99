//! Liveness probe

use axum::Json;

use crate::ApiResponse;

/// GET /healthcheck - Server is up
pub async fn health_check() -> Json<ApiResponse<()>> {
    ApiResponse::ok("ok")
}
