use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::verification_code_repository::VerificationCodeRepository;
use crate::domain::auth::verification_code::VerificationCode;
use crate::infrastructure::db::PgPool;

pub struct SqlxVerificationCodeRepository {
    pub pool: PgPool,
}

impl SqlxVerificationCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_code(r: PgRow) -> VerificationCode {
    VerificationCode {
        id: r.get("id"),
        user_id: r.get("user_id"),
        code: r.get("code"),
        created_at: r.get("created_at"),
        consumed_at: r.try_get("consumed_at").ok().flatten(),
        failed_attempts: r.get("failed_attempts"),
    }
}

#[async_trait]
impl VerificationCodeRepository for SqlxVerificationCodeRepository {
    async fn create_code(&self, user_id: Uuid, code: &str) -> anyhow::Result<VerificationCode> {
        let row = sqlx::query(
            r#"INSERT INTO verification_codes (user_id, code) VALUES ($1, $2)
               RETURNING id, user_id, code, created_at, consumed_at, failed_attempts"#,
        )
        .bind(user_id)
        .bind(code)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_code(row))
    }

    async fn find_latest_for_user(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<VerificationCode>> {
        let row = sqlx::query(
            r#"SELECT id, user_id, code, created_at, consumed_at, failed_attempts
               FROM verification_codes WHERE user_id = $1
               ORDER BY created_at DESC LIMIT 1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(map_code))
    }

    async fn record_failed_attempt(
        &self,
        code_id: Uuid,
        max_attempts: i32,
    ) -> anyhow::Result<Option<i32>> {
        let attempts = sqlx::query_scalar::<_, i32>(
            r#"UPDATE verification_codes
               SET failed_attempts = failed_attempts + 1,
                   consumed_at = CASE WHEN failed_attempts + 1 >= $2 THEN now() ELSE consumed_at END
               WHERE id = $1 AND consumed_at IS NULL
               RETURNING failed_attempts"#,
        )
        .bind(code_id)
        .bind(max_attempts)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempts)
    }
}
