use chrono::Utc;

use crate::application::dto::auth::AuthTokensDto;
use crate::application::ports::token_repository::TokenRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::jwt::JwtService;
use crate::application::use_cases::auth::tokens::issue_token_pair;
use crate::domain::auth::token::{TokenKind, hash_token};

#[derive(thiserror::Error, Debug)]
pub enum RefreshError {
    #[error("invalid refresh token")]
    InvalidToken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct RefreshToken<'a, U, T>
where
    U: UserRepository + ?Sized,
    T: TokenRepository + ?Sized,
{
    pub users: &'a U,
    pub tokens: &'a T,
    pub jwt: &'a JwtService,
}

impl<'a, U, T> RefreshToken<'a, U, T>
where
    U: UserRepository + ?Sized,
    T: TokenRepository + ?Sized,
{
    /// Rotates a refresh token: the presented one is revoked and a new pair is issued.
    pub async fn execute(&self, refresh_token: &str) -> Result<AuthTokensDto, RefreshError> {
        let claims = self
            .jwt
            .decode(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                tracing::debug!(error = %e, "refresh_token_rejected");
                RefreshError::InvalidToken
            })?;
        let user_id = claims.user_id().ok_or(RefreshError::InvalidToken)?;

        let record = self
            .tokens
            .find_by_hash(&hash_token(refresh_token))
            .await?
            .ok_or(RefreshError::InvalidToken)?;
        if record.user_id != user_id
            || record.kind != TokenKind::Refresh
            || !record.is_active(Utc::now())
        {
            return Err(RefreshError::InvalidToken);
        }
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(RefreshError::InvalidToken);
        }

        // A concurrent refresh with the same token loses the race here.
        if !self.tokens.revoke(record.id).await? {
            return Err(RefreshError::InvalidToken);
        }
        Ok(issue_token_pair(self.jwt, self.tokens, user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::test_support::{InMemoryStore, test_jwt};

    #[tokio::test]
    async fn rotates_refresh_token() {
        let store = InMemoryStore::default();
        let uid = store.seed_user("r@example.com", "pw", "USER").await;
        let jwt = test_jwt();
        let first = issue_token_pair(&jwt, &store, uid).await.unwrap();

        let uc = RefreshToken {
            users: &store,
            tokens: &store,
            jwt: &jwt,
        };
        let second = uc.execute(&first.refresh_token).await.unwrap();
        assert_eq!(second.user_id, uid);
        assert_ne!(second.refresh_token, first.refresh_token);

        let old = store.token(&hash_token(&first.refresh_token)).await.unwrap();
        assert!(old.revoked);

        // The rotated token cannot be replayed.
        let replay = uc.execute(&first.refresh_token).await.unwrap_err();
        assert!(matches!(replay, RefreshError::InvalidToken));
        assert!(uc.execute(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let store = InMemoryStore::default();
        let uid = store.seed_user("r@example.com", "pw", "USER").await;
        let jwt = test_jwt();
        let pair = issue_token_pair(&jwt, &store, uid).await.unwrap();
        let uc = RefreshToken {
            users: &store,
            tokens: &store,
            jwt: &jwt,
        };
        assert!(matches!(
            uc.execute(&pair.access_token).await,
            Err(RefreshError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn unrecorded_token_is_rejected() {
        let store = InMemoryStore::default();
        let uid = store.seed_user("r@example.com", "pw", "USER").await;
        let jwt = test_jwt();
        let forged = jwt.issue(uid, TokenKind::Refresh).unwrap();
        let uc = RefreshToken {
            users: &store,
            tokens: &store,
            jwt: &jwt,
        };
        assert!(matches!(
            uc.execute(&forged.token).await,
            Err(RefreshError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        let store = InMemoryStore::default();
        let jwt = test_jwt();
        let uc = RefreshToken {
            users: &store,
            tokens: &store,
            jwt: &jwt,
        };
        assert!(matches!(
            uc.execute("not.a.jwt").await,
            Err(RefreshError::InvalidToken)
        ));
    }
}
