/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// { "detail": "working", "version": "0.1.0" }
/// ```
///
/// Answers without touching the database, so it reports process liveness
/// only.

use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub detail: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        detail: "working".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
