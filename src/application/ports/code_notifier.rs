use async_trait::async_trait;

use crate::domain::users::user::User;

/// Delivers a freshly issued verification code to its owner.
#[async_trait]
pub trait CodeNotifier: Send + Sync {
    async fn send_code(&self, user: &User, code: &str) -> anyhow::Result<()>;
}
