//! HTTP handlers for uploading and listing images.
//! Upload bodies are streamed straight from the multipart field into the
//! storage backend without being buffered here.

use crate::{
    errors::AppError,
    models::listing::RecentImages,
    services::upload_service::UploadOutcome,
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde_json::json;
use std::io;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// `POST /uploadfile`
///
/// Validation rejections are answered with 200 and an `error` field; storage
/// faults surface as 500 through `AppError`.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::unprocessable(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let body = field.map(|chunk| chunk.map_err(io::Error::other)).boxed();

        let outcome = state
            .uploads
            .handle_upload(&original_name, &content_type, body)
            .await?;

        return Ok(match outcome {
            UploadOutcome::Rejected(reason) => (
                StatusCode::OK,
                Json(json!({ "error": reason.to_string() })),
            )
                .into_response(),
            UploadOutcome::Stored(response) => (StatusCode::OK, Json(response)).into_response(),
        });
    }

    Err(AppError::unprocessable(format!(
        "No `{}` field in multipart form",
        FILE_FIELD
    )))
}

/// `GET /recent` — every stored image, newest first.
pub async fn recent(State(state): State<AppState>) -> Result<Json<RecentImages>, AppError> {
    let images = state.listing.list_recent().await?;
    Ok(Json(RecentImages { images }))
}
