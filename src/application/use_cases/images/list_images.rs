use uuid::Uuid;

use crate::application::access;
use crate::application::ports::image_repository::ImageRepository;
use crate::application::ports::role_repository::RoleRepository;
use crate::application::use_cases::images::ViewImageError;
use crate::domain::auth::role::PERM_VIEW_IMAGE;
use crate::domain::users::image::Image;

pub struct ListImages<'a, I, R>
where
    I: ImageRepository + ?Sized,
    R: RoleRepository + ?Sized,
{
    pub images: &'a I,
    pub roles: &'a R,
}

impl<'a, I, R> ListImages<'a, I, R>
where
    I: ImageRepository + ?Sized,
    R: RoleRepository + ?Sized,
{
    pub async fn execute(&self, viewer: Uuid) -> Result<Vec<Image>, ViewImageError> {
        access::require_permission(self.roles, viewer, PERM_VIEW_IMAGE)
            .await
            .map_err(|_| ViewImageError::Forbidden)?;
        Ok(self.images.list_all().await?)
    }
}
