use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub size: i64,
}

#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> anyhow::Result<StoredObject>;
    /// `Ok(None)` when no object exists under `key`.
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
}
