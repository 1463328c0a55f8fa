use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::application::ports::role_repository::RoleRepository;
use crate::domain::auth::role::{Permission, Role};
use crate::infrastructure::db::PgPool;

pub struct SqlxRoleRepository {
    pub pool: PgPool,
}

impl SqlxRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for SqlxRoleRepository {
    async fn role_for_user(&self, user_id: Uuid) -> anyhow::Result<Option<Role>> {
        let rows = sqlx::query(
            r#"SELECT r.name AS role_name, p.name AS permission_name
               FROM users u
               JOIN roles r ON r.id = u.role_id
               LEFT JOIN role_permissions rp ON rp.role_id = r.id
               LEFT JOIN permissions p ON p.id = rp.permission_id
               WHERE u.id = $1"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let name: String = first.get("role_name");
        let permissions = rows
            .iter()
            .filter_map(|r| r.try_get::<Option<String>, _>("permission_name").ok().flatten())
            .map(|name| Permission { name })
            .collect();
        Ok(Some(Role { name, permissions }))
    }
}
