use uuid::Uuid;

use crate::application::access;
use crate::application::dto::uploads::FileUploadDto;
use crate::application::ports::image_repository::ImageRepository;
use crate::application::ports::role_repository::RoleRepository;
use crate::application::ports::storage_port::StoragePort;
use crate::application::services::uploads::{resolve_content_type, sanitize_file_name};
use crate::domain::auth::role::PERM_UPLOAD_IMAGE;
use crate::domain::users::image::{Image, NewImage, file_type_of};

#[derive(thiserror::Error, Debug)]
pub enum UploadImageError {
    #[error("missing permission `upload image`")]
    Forbidden,
    #[error("file must not be empty")]
    EmptyFile,
    #[error("Error")]
    Storage(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct UploadImage<'a, I, S, R>
where
    I: ImageRepository + ?Sized,
    S: StoragePort + ?Sized,
    R: RoleRepository + ?Sized,
{
    pub images: &'a I,
    pub storage: &'a S,
    pub roles: &'a R,
}

#[derive(Debug, Clone)]
pub struct UploadImageRequest {
    /// Display name; used as the object name when the file has none.
    pub name: Option<String>,
    /// Declared image type; defaults to the file extension.
    pub image_type: Option<String>,
    pub file: FileUploadDto,
}

impl<'a, I, S, R> UploadImage<'a, I, S, R>
where
    I: ImageRepository + ?Sized,
    S: StoragePort + ?Sized,
    R: RoleRepository + ?Sized,
{
    pub async fn execute(
        &self,
        owner_id: Uuid,
        req: &UploadImageRequest,
    ) -> Result<Image, UploadImageError> {
        access::require_permission(self.roles, owner_id, PERM_UPLOAD_IMAGE)
            .await
            .map_err(|_| UploadImageError::Forbidden)?;
        if req.file.is_empty() {
            return Err(UploadImageError::EmptyFile);
        }

        let original = req
            .file
            .file_name
            .as_deref()
            .or(req.name.as_deref())
            .unwrap_or("image.bin");
        let key = sanitize_file_name(original);
        let content_type = resolve_content_type(req.file.content_type.as_deref(), &key);
        let stored = self
            .storage
            .put_object(&key, &req.file.bytes, Some(&content_type))
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, key = %key, "image_upload_failed");
                UploadImageError::Storage(err)
            })?;

        let file_type = req
            .image_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| file_type_of(&stored.key));
        let image = self
            .images
            .insert_image(&NewImage {
                user_id: Some(owner_id),
                file_name: stored.key,
                file_type,
                content_type: Some(content_type),
                size: stored.size,
            })
            .await?;
        Ok(image)
    }
}
