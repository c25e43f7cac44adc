use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
}

/// GET /health
pub async fn check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse { status: "ok" })
}
