//! Represents an image accepted by the upload pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::bytes_to_mb;

/// A successfully persisted upload.
///
/// Created once per accepted request and never mutated afterwards; the bytes
/// themselves belong to the storage backend.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadedObject {
    /// Filename as sent by the client.
    pub original_name: String,

    /// Generated key the bytes were stored under.
    pub storage_key: String,

    /// Declared media type.
    pub content_type: String,

    /// Number of bytes written to the backend.
    pub size_bytes: u64,

    /// When the backend recorded the write.
    pub modified_time: DateTime<Utc>,
}

/// Per-file metadata returned from `POST /uploadfile`.
///
/// `size_bytes` holds the size in megabytes; existing clients read it that way.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FileData {
    pub original_name: String,
    pub unique_name: String,
    pub content_type: String,
    pub size_bytes: f64,
}

impl From<&UploadedObject> for FileData {
    fn from(object: &UploadedObject) -> Self {
        Self {
            original_name: object.original_name.clone(),
            unique_name: object.storage_key.clone(),
            content_type: object.content_type.clone(),
            size_bytes: bytes_to_mb(object.size_bytes),
        }
    }
}

/// Body of a successful upload. Backends with their own object URLs (S3)
/// wrap the file data with a direct and a presigned link.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum UploadResponse {
    Local(FileData),
    Remote {
        file_url: String,
        file_data: FileData,
        presigned_url: String,
    },
}
