use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::storage_port::{StoragePort, StoredObject};
use crate::infrastructure::storage::safe_relative_key;

/// Keeps objects as plain files below `uploads_root`.
pub struct FsStoragePort {
    pub uploads_root: PathBuf,
}

impl FsStoragePort {
    pub fn new(uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
        }
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let full = self.uploads_root.join(safe_relative_key(key)?);
        if !full.starts_with(&self.uploads_root) {
            anyhow::bail!("forbidden");
        }
        Ok(full)
    }
}

#[async_trait]
impl StoragePort for FsStoragePort {
    async fn put_object(
        &self,
        key: &str,
        bytes: &[u8],
        _content_type: Option<&str>,
    ) -> anyhow::Result<StoredObject> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write object {key}"))?;
        Ok(StoredObject {
            key: key.to_string(),
            size: bytes.len() as i64,
        })
    }

    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read object {key}")),
        }
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to delete object {key}")),
        }
    }
}
