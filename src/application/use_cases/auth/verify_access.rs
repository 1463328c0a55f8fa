use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::token_repository::TokenRepository;
use crate::application::services::jwt::JwtService;
use crate::domain::auth::token::{TokenKind, hash_token};

pub struct VerifyAccess<'a, T: TokenRepository + ?Sized> {
    pub tokens: &'a T,
    pub jwt: &'a JwtService,
}

impl<'a, T: TokenRepository + ?Sized> VerifyAccess<'a, T> {
    /// Resolves the user behind a bearer access token, or `None` when it is
    /// malformed, expired, revoked or unknown.
    pub async fn execute(&self, token: &str) -> anyhow::Result<Option<Uuid>> {
        let Ok(claims) = self.jwt.decode(token, TokenKind::Access) else {
            return Ok(None);
        };
        let Some(user_id) = claims.user_id() else {
            return Ok(None);
        };
        let record = self.tokens.find_by_hash(&hash_token(token)).await?;
        Ok(record
            .filter(|r| r.user_id == user_id && r.is_active(Utc::now()))
            .map(|r| r.user_id))
    }
}
