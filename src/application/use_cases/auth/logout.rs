use uuid::Uuid;

use crate::application::ports::token_repository::TokenRepository;

pub struct Logout<'a, T: TokenRepository + ?Sized> {
    pub tokens: &'a T,
}

impl<'a, T: TokenRepository + ?Sized> Logout<'a, T> {
    pub async fn execute(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let revoked = self.tokens.revoke_all_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "user_logged_out");
        Ok(revoked)
    }
}
