//! S3-compatible backend. Objects are written privately under `uploads/` and
//! handed out through presigned GET URLs.

use crate::services::storage_service::{
    ByteStream, PersistedRef, StorageBackend, StorageError, StorageResult, StoredObject,
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    Client,
    presigning::PresigningConfig,
    primitives::ByteStream as S3Body,
    types::Object as S3Object,
};
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::time::Duration;
use tracing::debug;

const KEY_PREFIX: &str = "uploads/";
pub const PRESIGNED_URL_EXPIRY: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl ObjectStore {
    /// Build a client from the default AWS credential chain.
    ///
    /// `endpoint_url` points the client at an S3-compatible service (MinIO
    /// and friends) and switches to path-style addressing.
    pub async fn connect(bucket: String, region: String, endpoint_url: Option<String>) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint_url.as_deref() {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::from_client(Client::from_conf(builder.build()), bucket, region, endpoint_url)
    }

    pub fn from_client(
        client: Client,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> Self {
        Self {
            client,
            bucket,
            region,
            endpoint_url,
        }
    }

    fn object_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}

#[async_trait]
impl StorageBackend for ObjectStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        mut body: ByteStream<'_>,
    ) -> StorageResult<PersistedRef> {
        // A single PUT needs the full length up front.
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|err| StorageError::WriteFailed {
                key: key.to_string(),
                reason: err.to_string(),
            })?;
            buf.extend_from_slice(&chunk);
        }
        let size_bytes = buf.len() as u64;
        let object_key = Self::object_key(key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type(content_type)
            .body(S3Body::from(buf.freeze()))
            .send()
            .await
            .map_err(|err| StorageError::WriteFailed {
                key: key.to_string(),
                reason: err.to_string(),
            })?;

        debug!(bucket = %self.bucket, key = %object_key, size_bytes, "stored object in S3");

        Ok(PersistedRef {
            key: key.to_string(),
            size_bytes,
            modified_time: Utc::now(),
        })
    }

    async fn list(&self) -> StorageResult<Vec<StoredObject>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(KEY_PREFIX)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| StorageError::ListFailed(err.to_string()))?;
            objects.extend(page.contents().iter().filter_map(stored_object));
        }

        Ok(objects)
    }

    async fn resolve_url(&self, key: &str) -> StorageResult<String> {
        let signing_failed = |reason: String| StorageError::UrlSigningFailed {
            key: key.to_string(),
            reason,
        };

        let presigning = PresigningConfig::expires_in(PRESIGNED_URL_EXPIRY)
            .map_err(|err| signing_failed(err.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(Self::object_key(key))
            .presigned(presigning)
            .await
            .map_err(|err| signing_failed(err.to_string()))?;

        Ok(request.uri().to_string())
    }

    fn object_url(&self, key: &str) -> Option<String> {
        let object_key = Self::object_key(key);
        Some(match self.endpoint_url.as_deref() {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                object_key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, object_key
            ),
        })
    }

    fn scheme(&self) -> &'static str {
        "s3"
    }
}

/// Map one ListObjectsV2 row onto a listing row. Keys outside `uploads/`
/// and "folder" placeholders are dropped.
fn stored_object(object: &S3Object) -> Option<StoredObject> {
    let key = object.key()?.strip_prefix(KEY_PREFIX)?;
    if key.is_empty() || key.ends_with('/') {
        return None;
    }

    let modified_time = object
        .last_modified()
        .and_then(|ts| DateTime::from_timestamp(ts.secs(), ts.subsec_nanos()))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let size_bytes = match object.size() {
        Some(size) if size >= 0 => size as u64,
        other => {
            debug!(key, size = ?other, "S3 listing row without a usable size; reporting 0");
            0
        }
    };

    Some(StoredObject {
        key: key.to_string(),
        size_bytes,
        modified_time,
    })
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::{config::Credentials, primitives::DateTime as S3DateTime};

    /// Presigning is pure computation, so a client with static credentials
    /// works without any network access.
    fn offline_store(endpoint_url: Option<String>) -> ObjectStore {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("ap-south-1"))
            .credentials_provider(Credentials::new("AKIDEXAMPLE", "secret", None, None, "test"))
            .build();
        ObjectStore::from_client(
            Client::from_conf(config),
            "pics".into(),
            "ap-south-1".into(),
            endpoint_url,
        )
    }

    #[test]
    fn object_url_uses_virtual_hosted_style() {
        let store = offline_store(None);
        assert_eq!(
            store.object_url("abc.png").as_deref(),
            Some("https://pics.s3.ap-south-1.amazonaws.com/uploads/abc.png")
        );
    }

    #[test]
    fn object_url_honours_custom_endpoint() {
        let store = offline_store(Some("http://localhost:9000/".into()));
        assert_eq!(
            store.object_url("abc.png").as_deref(),
            Some("http://localhost:9000/pics/uploads/abc.png")
        );
    }

    #[tokio::test]
    async fn presigned_url_targets_prefixed_key_for_an_hour() {
        let store = offline_store(None);
        let url = store.resolve_url("abc.png").await.unwrap();

        assert!(url.contains("uploads/abc.png"), "{url}");
        assert!(url.contains("X-Amz-Expires=3600"), "{url}");
        assert!(url.contains("X-Amz-Signature="), "{url}");
    }

    #[test]
    fn listing_rows_strip_the_upload_prefix() {
        let row = S3Object::builder()
            .key("uploads/abc.png")
            .size(42)
            .last_modified(S3DateTime::from_secs(1_700_000_000))
            .build();

        let stored = stored_object(&row).unwrap();
        assert_eq!(stored.key, "abc.png");
        assert_eq!(stored.size_bytes, 42);
        assert_eq!(stored.modified_time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn listing_skips_placeholders_and_foreign_keys() {
        for key in ["uploads/", "uploads/nested/", "other/abc.png"] {
            let row = S3Object::builder().key(key).size(0).build();
            assert_eq!(stored_object(&row), None, "{key}");
        }
        assert_eq!(stored_object(&S3Object::builder().size(1).build()), None);
    }

    #[test]
    fn listing_rows_without_metadata_fall_back() {
        let row = S3Object::builder().key("uploads/bare.gif").build();

        let stored = stored_object(&row).unwrap();
        assert_eq!(stored.size_bytes, 0);
        assert_eq!(stored.modified_time, DateTime::<Utc>::UNIX_EPOCH);
    }
}
