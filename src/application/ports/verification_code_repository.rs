use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::auth::verification_code::VerificationCode;

#[async_trait]
pub trait VerificationCodeRepository: Send + Sync {
    async fn create_code(&self, user_id: Uuid, code: &str) -> anyhow::Result<VerificationCode>;
    async fn find_latest_for_user(&self, user_id: Uuid)
    -> anyhow::Result<Option<VerificationCode>>;
    /// Counts a wrong guess against an unconsumed code and burns it once
    /// `max_attempts` is reached. Returns the new count, or `None` if the code
    /// was already consumed.
    async fn record_failed_attempt(
        &self,
        code_id: Uuid,
        max_attempts: i32,
    ) -> anyhow::Result<Option<i32>>;
}
