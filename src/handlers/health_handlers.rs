//! Liveness handler.
//!
//! - GET /health -> `{"status":"ok"}`

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /health`
///
/// Always 200; never touches the storage backend.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}
