use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::token_repository::TokenRepository;
use crate::domain::auth::token::{TokenKind, TokenRecord};
use crate::infrastructure::db::PgPool;

pub struct SqlxTokenRepository {
    pub pool: PgPool,
}

impl SqlxTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_token(r: PgRow) -> anyhow::Result<TokenRecord> {
    let kind: String = r.get("kind");
    Ok(TokenRecord {
        id: r.get("id"),
        user_id: r.get("user_id"),
        token_hash: r.get("token_hash"),
        kind: kind.parse()?,
        expires_at: r.get("expires_at"),
        revoked: r.get("revoked"),
    })
}

#[async_trait]
impl TokenRepository for SqlxTokenRepository {
    async fn save_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<TokenRecord> {
        let row = sqlx::query(
            r#"INSERT INTO tokens (user_id, token_hash, kind, expires_at)
               VALUES ($1, $2, $3, $4)
               RETURNING id, user_id, token_hash, kind, expires_at, revoked"#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(kind.as_str())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        map_token(row)
    }

    async fn find_by_hash(&self, token_hash: &str) -> anyhow::Result<Option<TokenRecord>> {
        let row = sqlx::query(
            r#"SELECT id, user_id, token_hash, kind, expires_at, revoked
               FROM tokens WHERE token_hash = $1"#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        row.map(map_token).transpose()
    }

    async fn revoke(&self, token_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE tokens SET revoked = true WHERE id = $1 AND revoked = false")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"UPDATE tokens SET revoked = true
               WHERE user_id = $1 AND revoked = false AND expires_at > now()"#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }
}
