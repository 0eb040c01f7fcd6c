//! Local-disk backend. Objects live as flat files directly under the storage
//! root and are served back by the static file handler mounted at
//! `/{mount_prefix}`.

use crate::services::storage_service::{
    ByteStream, PersistedRef, StorageBackend, StorageError, StorageResult, StoredObject,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::StreamReader;
use tracing::debug;
use uuid::Uuid;

/// Hidden directory for in-flight uploads. Being a directory, it never
/// appears in a listing.
const STAGING_DIR: &str = ".staging";

#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    root: PathBuf,
    mount_prefix: String,
}

impl LocalDiskStore {
    /// Open the store at `root`, creating the directory tree if needed.
    pub async fn open(root: impl Into<PathBuf>, mount_prefix: impl Into<String>) -> io::Result<Self> {
        let mount_prefix = mount_prefix.into().trim_matches('/').to_string();
        if mount_prefix.is_empty() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                "mount prefix must not be empty",
            ));
        }
        let root = root.into();
        fs::create_dir_all(root.join(STAGING_DIR)).await?;
        Ok(Self { root, mount_prefix })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }

    /// Keys are generated, but the extension comes from the client, so keep
    /// anything that could escape the root out.
    fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty()
            || key.starts_with('.')
            || key.contains("..")
            || key
                .bytes()
                .any(|b| b.is_ascii_control() || b == b'/' || b == b'\\')
        {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: "invalid object key".into(),
            });
        }
        Ok(self.root.join(key))
    }

    /// Stream `body` into a staging file, fsync it and return the byte count.
    /// The staging file is removed on any error.
    async fn write_staged(&self, tmp_path: &Path, body: ByteStream<'_>) -> io::Result<u64> {
        let mut file = File::create(tmp_path).await?;
        let mut reader = StreamReader::new(body);
        let result = async {
            let written = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok::<_, io::Error>(written)
        }
        .await;

        if result.is_err() {
            let _ = fs::remove_file(tmp_path).await;
        }
        result
    }
}

#[async_trait]
impl StorageBackend for LocalDiskStore {
    async fn put(
        &self,
        key: &str,
        _content_type: &str,
        body: ByteStream<'_>,
    ) -> StorageResult<PersistedRef> {
        let file_path = self.object_path(key)?;
        let write_failed = |err: io::Error| StorageError::WriteFailed {
            key: key.to_string(),
            reason: err.to_string(),
        };

        let staging = self.root.join(STAGING_DIR);
        fs::create_dir_all(&staging).await.map_err(write_failed)?;
        let tmp_path = staging.join(format!(".tmp-{}", Uuid::new_v4()));

        let size_bytes = self
            .write_staged(&tmp_path, body)
            .await
            .map_err(write_failed)?;

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_failed(err));
        }

        let modified_time = fs::metadata(&file_path)
            .await
            .and_then(|meta| meta.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        debug!(key, size_bytes, path = %file_path.display(), "stored object on disk");

        Ok(PersistedRef {
            key: key.to_string(),
            size_bytes,
            modified_time,
        })
    }

    async fn list(&self) -> StorageResult<Vec<StoredObject>> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StorageError::ListFailed(err.to_string())),
        };

        let mut objects = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            // Entries can vanish between readdir and stat; skip them.
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(StorageError::Io(err)),
            };
            if !meta.is_file() {
                continue;
            }
            objects.push(StoredObject {
                key: entry.file_name().to_string_lossy().into_owned(),
                size_bytes: meta.len(),
                modified_time: DateTime::<Utc>::from(meta.modified()?),
            });
        }

        Ok(objects)
    }

    async fn resolve_url(&self, key: &str) -> StorageResult<String> {
        Ok(format!("/{}/{}", self.mount_prefix, key))
    }

    fn scheme(&self) -> &'static str {
        "local"
    }
}
