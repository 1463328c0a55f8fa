use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};
use uuid::Uuid;

use crate::application::ports::image_repository::ImageRepository;
use crate::domain::users::image::{Image, NewImage};
use crate::infrastructure::db::PgPool;

pub struct SqlxImageRepository {
    pub pool: PgPool,
}

impl SqlxImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) const IMAGE_COLUMNS: &str =
    "id, user_id, file_name, type, content_type, size, created_at";

pub(crate) fn map_image(r: PgRow) -> Image {
    Image {
        id: r.get("id"),
        user_id: r.try_get("user_id").ok().flatten(),
        file_name: r.get("file_name"),
        file_type: r.get("type"),
        content_type: r.try_get("content_type").ok().flatten(),
        size: r.get("size"),
        created_at: r.get("created_at"),
    }
}

/// Inserts on any executor so the row can join a caller's transaction.
pub(crate) async fn insert_image_with<'e, E: PgExecutor<'e>>(
    executor: E,
    image: &NewImage,
    user_id: Option<Uuid>,
) -> Result<Image, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"INSERT INTO images (user_id, file_name, type, content_type, size)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING {IMAGE_COLUMNS}"#
    ))
    .bind(user_id)
    .bind(&image.file_name)
    .bind(&image.file_type)
    .bind(image.content_type.as_deref())
    .bind(image.size)
    .fetch_one(executor)
    .await?;
    Ok(map_image(row))
}

#[async_trait]
impl ImageRepository for SqlxImageRepository {
    async fn insert_image(&self, image: &NewImage) -> anyhow::Result<Image> {
        Ok(insert_image_with(&self.pool, image, image.user_id).await?)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Image>> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, file_name, type, content_type, size, created_at
               FROM images ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(map_image).collect())
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Image>> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, file_name, type, content_type, size, created_at
               FROM images WHERE user_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(map_image).collect())
    }

    async fn find_by_file_name(&self, file_name: &str) -> anyhow::Result<Option<Image>> {
        let row = sqlx::query(
            r#"SELECT id, user_id, file_name, type, content_type, size, created_at
               FROM images WHERE file_name = $1
               ORDER BY created_at DESC LIMIT 1"#,
        )
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(map_image))
    }

    async fn count_by_file_name(&self, file_name: &str) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM images WHERE file_name = $1")
            .bind(file_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
