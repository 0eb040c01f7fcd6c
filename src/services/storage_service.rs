//! src/services/storage_service.rs
//!
//! The storage capability shared by both deployment variants. A backend owns
//! the durability of uploaded bytes; everything above it (validation, key
//! generation, listing order) is backend-agnostic.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::io;
use thiserror::Error;

/// Incoming upload body, consumed exactly once by [`StorageBackend::put`].
pub type ByteStream<'a> = BoxStream<'a, io::Result<Bytes>>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write object `{key}`: {reason}")]
    WriteFailed { key: String, reason: String },
    #[error("failed to list stored objects: {0}")]
    ListFailed(String),
    #[error("failed to sign url for `{key}`: {reason}")]
    UrlSigningFailed { key: String, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// What a backend reports after a successful `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRef {
    pub key: String,
    pub size_bytes: u64,
    pub modified_time: DateTime<Utc>,
}

/// One row of a backend listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size_bytes: u64,
    pub modified_time: DateTime<Utc>,
}

/// Durable object storage addressed by generated keys.
///
/// Implementations must make `put` atomic-or-absent with respect to `list`:
/// an object that failed to upload never shows up in a listing.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Consume `body` and persist it under `key`.
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        body: ByteStream<'_>,
    ) -> StorageResult<PersistedRef>;

    /// Enumerate everything currently stored. Never cached.
    async fn list(&self) -> StorageResult<Vec<StoredObject>>;

    /// URL a client can fetch `key` from without further credentials.
    async fn resolve_url(&self, key: &str) -> StorageResult<String>;

    /// Direct, unsigned location of `key` when the backend exposes one.
    fn object_url(&self, _key: &str) -> Option<String> {
        None
    }

    /// Short backend name for logs ("local", "s3").
    fn scheme(&self) -> &'static str;
}
