use uuid::Uuid;

use crate::application::dto::auth::AuthTokensDto;
use crate::application::ports::token_repository::TokenRepository;
use crate::application::services::jwt::JwtService;
use crate::domain::auth::token::{IssuedToken, TokenKind, hash_token};

async fn issue_and_record<T: TokenRepository + ?Sized>(
    jwt: &JwtService,
    tokens: &T,
    user_id: Uuid,
    kind: TokenKind,
) -> anyhow::Result<IssuedToken> {
    let issued = jwt.issue(user_id, kind)?;
    tokens
        .save_token(user_id, &hash_token(&issued.token), kind, issued.expires_at)
        .await?;
    Ok(issued)
}

/// Signs a fresh access/refresh pair and records both.
pub async fn issue_token_pair<T: TokenRepository + ?Sized>(
    jwt: &JwtService,
    tokens: &T,
    user_id: Uuid,
) -> anyhow::Result<AuthTokensDto> {
    let access = issue_and_record(jwt, tokens, user_id, TokenKind::Access).await?;
    let refresh = issue_and_record(jwt, tokens, user_id, TokenKind::Refresh).await?;
    Ok(AuthTokensDto {
        access_token: access.token,
        refresh_token: refresh.token,
        user_id,
    })
}
