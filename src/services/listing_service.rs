//! Newest-first listing of everything a backend currently holds.

use crate::{
    models::listing::ListingEntry,
    services::storage_service::{StorageBackend, StorageResult},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct ListingService {
    backend: Arc<dyn StorageBackend>,
}

impl ListingService {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Every stored object, most recently modified first. Ties are broken by
    /// key so the order is deterministic.
    pub async fn list_recent(&self) -> StorageResult<Vec<ListingEntry>> {
        let mut objects = self.backend.list().await?;
        objects.sort_by(|a, b| {
            b.modified_time
                .cmp(&a.modified_time)
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut entries = Vec::with_capacity(objects.len());
        for object in objects {
            let url = self.backend.resolve_url(&object.key).await?;
            entries.push(ListingEntry::new(
                object.key,
                object.size_bytes,
                object.modified_time,
                url,
            ));
        }
        Ok(entries)
    }
}
