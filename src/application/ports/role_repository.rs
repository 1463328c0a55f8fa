use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::auth::role::Role;

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn role_for_user(&self, user_id: Uuid) -> anyhow::Result<Option<Role>>;
}
