use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::user_repository::{
    CreateUserOutcome, ProfileUpdate, ProfileUpdateOutcome, UserRepository, UserRow,
};
use crate::domain::users::image::NewImage;
use crate::domain::users::user::{NewUser, User};
use crate::infrastructure::db::repositories::image_repository_sqlx::{
    IMAGE_COLUMNS, insert_image_with, map_image,
};
use crate::infrastructure::db::{PgPool, is_unique_violation};

pub struct SqlxUserRepository {
    pub pool: PgPool,
}

impl SqlxUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_USER: &str = r#"SELECT u.id, u.firstname, u.lastname, u.email, u.password_hash,
       u.created_at, u.updated_at, r.name AS role
FROM users u LEFT JOIN roles r ON r.id = u.role_id"#;

fn map_user(r: &PgRow) -> User {
    User {
        id: r.get("id"),
        firstname: r.get("firstname"),
        lastname: r.get("lastname"),
        email: r.get("email"),
        role: r.try_get("role").ok().flatten(),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn map_row(r: PgRow) -> UserRow {
    UserRow {
        user: map_user(&r),
        password_hash: r.get("password_hash"),
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_user(
        &self,
        new_user: &NewUser,
        avatar: Option<&NewImage>,
    ) -> anyhow::Result<CreateUserOutcome> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            r#"WITH inserted AS (
                 INSERT INTO users (firstname, lastname, email, password_hash, role_id)
                 VALUES ($1, $2, $3, $4, (SELECT id FROM roles WHERE name = $5))
                 RETURNING id, firstname, lastname, email, role_id, created_at, updated_at
               )
               SELECT i.id, i.firstname, i.lastname, i.email, i.created_at, i.updated_at,
                      r.name AS role
               FROM inserted i LEFT JOIN roles r ON r.id = i.role_id"#,
        )
        .bind(&new_user.firstname)
        .bind(&new_user.lastname)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.role)
        .fetch_one(&mut *tx)
        .await;
        let user = match inserted {
            Ok(row) => map_user(&row),
            Err(err) if is_unique_violation(&err) => return Ok(CreateUserOutcome::EmailTaken),
            Err(err) => return Err(err.into()),
        };
        if let Some(image) = avatar {
            insert_image_with(&mut *tx, image, Some(user.id)).await?;
        }
        tx.commit().await?;
        Ok(CreateUserOutcome::Created(user))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE u.email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_row))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRow>> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_row))
    }

    async fn apply_profile_update(
        &self,
        update: &ProfileUpdate,
    ) -> anyhow::Result<ProfileUpdateOutcome> {
        let mut tx = self.pool.begin().await?;
        let changes = &update.changes;
        let updated = sqlx::query(
            r#"UPDATE users SET firstname = $2, lastname = $3, email = $4, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(update.user_id)
        .bind(&changes.firstname)
        .bind(&changes.lastname)
        .bind(&changes.email)
        .execute(&mut *tx)
        .await;
        match updated {
            Ok(res) if res.rows_affected() == 0 => return Ok(ProfileUpdateOutcome::UserNotFound),
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => return Ok(ProfileUpdateOutcome::EmailTaken),
            Err(err) => return Err(err.into()),
        }

        if let Some(code_id) = update.consume_code {
            let res = sqlx::query(
                r#"UPDATE verification_codes SET consumed_at = now()
                   WHERE id = $1 AND user_id = $2 AND consumed_at IS NULL"#,
            )
            .bind(code_id)
            .bind(update.user_id)
            .execute(&mut *tx)
            .await?;
            if res.rows_affected() == 0 {
                return Ok(ProfileUpdateOutcome::CodeAlreadyUsed);
            }
        }

        let removed_images = if update.replace_images {
            let rows = sqlx::query(&format!(
                "DELETE FROM images WHERE user_id = $1 RETURNING {IMAGE_COLUMNS}"
            ))
            .bind(update.user_id)
            .fetch_all(&mut *tx)
            .await?;
            rows.into_iter().map(map_image).collect()
        } else {
            Vec::new()
        };
        if let Some(image) = &update.new_image {
            insert_image_with(&mut *tx, image, Some(update.user_id)).await?;
        }

        tx.commit().await?;
        Ok(ProfileUpdateOutcome::Applied { removed_images })
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }
}
