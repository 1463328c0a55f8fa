use uuid::Uuid;

use crate::application::access;
use crate::application::ports::image_repository::ImageRepository;
use crate::application::ports::role_repository::RoleRepository;
use crate::application::ports::storage_port::StoragePort;
use crate::application::services::uploads::resolve_content_type;
use crate::application::use_cases::images::ViewImageError;
use crate::domain::auth::role::PERM_VIEW_IMAGE;

pub struct GetImage<'a, I, S, R>
where
    I: ImageRepository + ?Sized,
    S: StoragePort + ?Sized,
    R: RoleRepository + ?Sized,
{
    pub images: &'a I,
    pub storage: &'a S,
    pub roles: &'a R,
}

pub struct ImageContent {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl<'a, I, S, R> GetImage<'a, I, S, R>
where
    I: ImageRepository + ?Sized,
    S: StoragePort + ?Sized,
    R: RoleRepository + ?Sized,
{
    /// Only objects recorded as images are served.
    pub async fn execute(
        &self,
        viewer: Uuid,
        file_name: &str,
    ) -> Result<Option<ImageContent>, ViewImageError> {
        access::require_permission(self.roles, viewer, PERM_VIEW_IMAGE)
            .await
            .map_err(|_| ViewImageError::Forbidden)?;
        let Some(image) = self.images.find_by_file_name(file_name).await? else {
            return Ok(None);
        };
        let Some(bytes) = self.storage.get_object(&image.file_name).await? else {
            tracing::warn!(key = %image.file_name, "image_row_without_object");
            return Ok(None);
        };
        Ok(Some(ImageContent {
            content_type: resolve_content_type(image.content_type.as_deref(), &image.file_name),
            bytes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::images::list_images::ListImages;
    use crate::application::use_cases::test_support::InMemoryStore;

    #[tokio::test]
    async fn serves_recorded_image() {
        let store = InMemoryStore::default();
        let uid = store.seed_user("u@example.com", "pw", "USER").await;
        let key = store.seed_image(uid, "1-face.png").await;
        let out = GetImage {
            images: &store,
            storage: &store,
            roles: &store,
        }
        .execute(uid, &key)
        .await
        .unwrap()
        .unwrap();
        assert_eq!(out.content_type, "image/png");
        assert!(!out.bytes.is_empty());

        let all = ListImages {
            images: &store,
            roles: &store,
        }
        .execute(uid)
        .await
        .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn unrecorded_object_is_not_served() {
        let store = InMemoryStore::default();
        let uid = store.seed_user("u@example.com", "pw", "USER").await;
        store.put_raw_object("secret.txt", b"x").await;
        let out = GetImage {
            images: &store,
            storage: &store,
            roles: &store,
        }
        .execute(uid, "secret.txt")
        .await
        .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn viewing_requires_view_image_permission() {
        let store = InMemoryStore::default();
        let owner = store.seed_user("u@example.com", "pw", "USER").await;
        let roleless = store.seed_user("nobody@example.com", "pw", "").await;
        let key = store.seed_image(owner, "1-face.png").await;

        let err = GetImage {
            images: &store,
            storage: &store,
            roles: &store,
        }
        .execute(roleless, &key)
        .await
        .err()
        .unwrap();
        assert!(matches!(err, ViewImageError::Forbidden));

        let err = ListImages {
            images: &store,
            roles: &store,
        }
        .execute(roleless)
        .await
        .unwrap_err();
        assert!(matches!(err, ViewImageError::Forbidden));
    }
}
