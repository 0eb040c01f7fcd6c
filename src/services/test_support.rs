//! In-memory backend for exercising the services without a disk or bucket.

use crate::services::storage_service::{
    ByteStream, PersistedRef, StorageBackend, StorageError, StorageResult, StoredObject,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<Vec<(StoredObject, Vec<u8>, String)>>,
    pub fail_writes: bool,
    pub signed: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn signed() -> Self {
        Self {
            signed: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, key: &str, size_bytes: u64, modified_time: DateTime<Utc>) {
        self.objects.lock().unwrap().push((
            StoredObject {
                key: key.to_string(),
                size_bytes,
                modified_time,
            },
            vec![0; size_bytes as usize],
            "image/png".into(),
        ));
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageBackend for MemoryStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        mut body: ByteStream<'_>,
    ) -> StorageResult<PersistedRef> {
        let mut data = Vec::new();
        while let Some(chunk) = body.next().await {
            data.extend_from_slice(&chunk?);
        }
        if self.fail_writes {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: "disk full".into(),
            });
        }

        let stored = StoredObject {
            key: key.to_string(),
            size_bytes: data.len() as u64,
            modified_time: Utc::now(),
        };
        let persisted = PersistedRef {
            key: stored.key.clone(),
            size_bytes: stored.size_bytes,
            modified_time: stored.modified_time,
        };
        self.objects
            .lock()
            .unwrap()
            .push((stored, data, content_type.to_string()));
        Ok(persisted)
    }

    async fn list(&self) -> StorageResult<Vec<StoredObject>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|(object, _, _)| object.clone())
            .collect())
    }

    async fn resolve_url(&self, key: &str) -> StorageResult<String> {
        if self.signed {
            Ok(format!("https://mem.example/{key}?signature=abc"))
        } else {
            Ok(format!("/uploadedfiles/{key}"))
        }
    }

    fn object_url(&self, key: &str) -> Option<String> {
        self.signed.then(|| format!("https://mem.example/{key}"))
    }

    fn scheme(&self) -> &'static str {
        "memory"
    }
}
