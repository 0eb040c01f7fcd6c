//! Defines the HTTP surface of the uploader.
//!
//! ## Structure
//! - `GET  /health`              — liveness
//! - `GET  /recent`              — stored images, newest first
//! - `POST /uploadfile`          — multipart upload, field `file`
//! - `GET  /{mount_prefix}/{key}` — stored files (local backend only)

use crate::{
    handlers::{
        health_handlers::health,
        upload_handlers::{recent, upload_file},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::path::PathBuf;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Directory served verbatim under `/{prefix}`.
#[derive(Debug, Clone)]
pub struct StaticMount {
    pub prefix: String,
    pub dir: PathBuf,
}

/// Build the router. The caller attaches `AppState` with `with_state`.
///
/// Upload size is not capped here, so axum's default body limit is lifted
/// for the upload route.
pub fn routes(static_files: Option<StaticMount>) -> Router<AppState> {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/recent", get(recent))
        .route(
            "/uploadfile",
            post(upload_file).layer(DefaultBodyLimit::disable()),
        );

    if let Some(mount) = static_files {
        let path = format!("/{}", mount.prefix.trim_matches('/'));
        let files = Router::new()
            .fallback_service(ServeDir::new(mount.dir))
            .layer(middleware::from_fn(hide_dot_paths));
        router = router.nest(&path, files);
    }

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// 404 for any path segment starting with a dot, encoded or not. Keeps the
/// upload staging area and other hidden files out of the static mount.
async fn hide_dot_paths(req: Request, next: Next) -> Response {
    let hidden = req.uri().path().split('/').any(|segment| {
        segment.starts_with('.') || segment.to_ascii_lowercase().starts_with("%2e")
    });
    if hidden {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(req).await
}
