//! Shared handler state, built once in `main` and cloned per request.

use crate::services::{
    listing_service::ListingService, storage_service::StorageBackend,
    upload_service::UploadService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadService,
    pub listing: ListingService,
}

impl AppState {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            uploads: UploadService::new(backend.clone()),
            listing: ListingService::new(backend),
        }
    }
}
