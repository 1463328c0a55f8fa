use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::users::image::{Image, NewImage};
use crate::domain::users::user::{NewUser, ProfileChanges, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug)]
pub enum CreateUserOutcome {
    Created(User),
    EmailTaken,
}

/// Every write of a profile update; applied atomically.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub user_id: Uuid,
    pub changes: ProfileChanges,
    /// Verification code spent on an email change.
    pub consume_code: Option<Uuid>,
    /// Detach the user's current images.
    pub replace_images: bool,
    /// Attached after the old images are detached. Its `user_id` is ignored.
    pub new_image: Option<NewImage>,
}

#[derive(Debug)]
pub enum ProfileUpdateOutcome {
    /// Rows detached from the user; their objects may still be referenced elsewhere.
    Applied { removed_images: Vec<Image> },
    UserNotFound,
    EmailTaken,
    CodeAlreadyUsed,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool>;
    /// Inserts the user and, when given, its avatar row in one transaction.
    async fn create_user(
        &self,
        new_user: &NewUser,
        avatar: Option<&NewImage>,
    ) -> anyhow::Result<CreateUserOutcome>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRow>>;
    async fn apply_profile_update(
        &self,
        update: &ProfileUpdate,
    ) -> anyhow::Result<ProfileUpdateOutcome>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool>;
}
