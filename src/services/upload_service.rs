//! UploadService — validate, name, persist and describe one uploaded image.

use crate::{
    models::object::{FileData, UploadResponse, UploadedObject},
    services::{
        keygen,
        storage_service::{ByteStream, StorageBackend, StorageResult},
        validator::{self, Rejection},
    },
};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of an upload that did not hit a server-side fault.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Bad input; nothing was written.
    Rejected(Rejection),
    Stored(UploadResponse),
}

#[derive(Clone)]
pub struct UploadService {
    backend: Arc<dyn StorageBackend>,
}

impl UploadService {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Run the full pipeline for one file.
    ///
    /// Validation failures come back as `Ok(UploadOutcome::Rejected)`; only
    /// storage and URL-signing failures are errors. Exactly one backend write
    /// happens per stored upload and none per rejection.
    pub async fn handle_upload(
        &self,
        original_name: &str,
        content_type: &str,
        body: ByteStream<'_>,
    ) -> StorageResult<UploadOutcome> {
        if let Err(reason) = validator::validate(content_type, original_name) {
            warn!(original_name, content_type, %reason, "upload rejected");
            return Ok(UploadOutcome::Rejected(reason));
        }

        let key = keygen::generate_key(original_name);
        let persisted = self.backend.put(&key, content_type, body).await?;

        let object = UploadedObject {
            original_name: original_name.to_string(),
            storage_key: persisted.key,
            content_type: content_type.to_string(),
            size_bytes: persisted.size_bytes,
            modified_time: persisted.modified_time,
        };
        info!(
            backend = self.backend.scheme(),
            original_name,
            key = %object.storage_key,
            size_bytes = object.size_bytes,
            modified_time = %object.modified_time,
            "upload stored"
        );

        let file_data = FileData::from(&object);
        let response = match self.backend.object_url(&object.storage_key) {
            Some(file_url) => UploadResponse::Remote {
                file_url,
                presigned_url: self.backend.resolve_url(&object.storage_key).await?,
                file_data,
            },
            None => UploadResponse::Local(file_data),
        };

        Ok(UploadOutcome::Stored(response))
    }
}
