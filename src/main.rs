use anyhow::{Context, Result};
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;

use config::{AppConfig, BackendKind};
use routes::routes::StaticMount;
use services::{
    local_store::LocalDiskStore, object_store::ObjectStore, storage_service::StorageBackend,
};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config (.env first, then env + CLI) ---
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            tracing::warn!("Ignoring unreadable .env file: {}", err);
        }
    }
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting image-uploader with config: {:?}", cfg);

    // --- Initialize storage backend ---
    let (backend, static_files) = build_backend(&cfg).await?;
    tracing::info!("Using {} storage backend", backend.scheme());

    // --- Build router ---
    let app: Router = routes::routes::routes(static_files).with_state(AppState::new(backend));

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Construct the configured backend, plus the directory to serve statically
/// when the backend keeps files on local disk.
async fn build_backend(
    cfg: &AppConfig,
) -> Result<(Arc<dyn StorageBackend>, Option<StaticMount>)> {
    match cfg.backend {
        BackendKind::Local => {
            let store = LocalDiskStore::open(&cfg.storage_dir, cfg.mount_prefix.as_str())
                .await
                .with_context(|| format!("creating storage directory {}", cfg.storage_dir))?;
            tracing::info!("Storing uploads in {}", store.root().display());
            let mount = StaticMount {
                prefix: store.mount_prefix().to_string(),
                dir: store.root().to_path_buf(),
            };
            Ok((Arc::new(store), Some(mount)))
        }
        BackendKind::S3 => {
            let s3 = cfg
                .s3
                .clone()
                .context("S3 backend selected without S3 configuration")?;
            tracing::info!("Storing uploads in bucket {} ({})", s3.bucket, s3.region);
            let store = ObjectStore::connect(s3.bucket, s3.region, s3.endpoint_url).await;
            Ok((Arc::new(store), None))
        }
    }
}
