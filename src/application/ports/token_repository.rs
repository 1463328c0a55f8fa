use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::auth::token::{TokenKind, TokenRecord};

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn save_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<TokenRecord>;
    async fn find_by_hash(&self, token_hash: &str) -> anyhow::Result<Option<TokenRecord>>;
    async fn revoke(&self, token_id: Uuid) -> anyhow::Result<bool>;
    /// Returns the number of tokens that were still active.
    async fn revoke_all_for_user(&self, user_id: Uuid) -> anyhow::Result<u64>;
}
