use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::users::image::{Image, NewImage};

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn insert_image(&self, image: &NewImage) -> anyhow::Result<Image>;
    async fn list_all(&self) -> anyhow::Result<Vec<Image>>;
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Image>>;
    async fn find_by_file_name(&self, file_name: &str) -> anyhow::Result<Option<Image>>;
    /// Rows still pointing at the object `file_name`.
    async fn count_by_file_name(&self, file_name: &str) -> anyhow::Result<i64>;
}
