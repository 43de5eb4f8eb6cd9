//! Health check handler

use serde::Serialize;
use utoipa::ToSchema;

use super::super::types::{ApiResult, ok};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    /// Git revision baked in at build time
    pub version: &'static str,
}

/// Liveness probe
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "Health"
)]
pub async fn health_check() -> ApiResult<HealthResponse> {
    ok(HealthResponse {
        status: "ok",
        version: env!("GIT_HASH"),
    })
}
