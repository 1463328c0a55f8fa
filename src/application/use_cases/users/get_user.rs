use uuid::Uuid;

use crate::application::ports::image_repository::ImageRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::domain::users::user::UserProfile;

pub struct GetUser<'a, U, I>
where
    U: UserRepository + ?Sized,
    I: ImageRepository + ?Sized,
{
    pub users: &'a U,
    pub images: &'a I,
}

impl<'a, U, I> GetUser<'a, U, I>
where
    U: UserRepository + ?Sized,
    I: ImageRepository + ?Sized,
{
    pub async fn execute(&self, id: Uuid) -> anyhow::Result<Option<UserProfile>> {
        let Some(row) = self.users.find_by_id(id).await? else {
            return Ok(None);
        };
        let images = self.images.list_for_user(id).await?;
        Ok(Some(UserProfile {
            user: row.user,
            images,
        }))
    }
}
