use uuid::Uuid;

use crate::application::ports::user_repository::UserRepository;
use crate::application::services::passwords::{hash_password, verify_password};

#[derive(thiserror::Error, Debug)]
pub enum ChangePasswordError {
    #[error("Error")]
    UserNotFound,
    #[error("The old password is incorrect!")]
    IncorrectOldPassword,
    #[error("{0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct ChangePassword<'a, U: UserRepository + ?Sized> {
    pub users: &'a U,
}

#[derive(Debug, Clone)]
pub struct ChangePasswordRequest {
    pub password_old: String,
    pub password_new: String,
}

impl<'a, U: UserRepository + ?Sized> ChangePassword<'a, U> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        req: &ChangePasswordRequest,
    ) -> Result<(), ChangePasswordError> {
        let row = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ChangePasswordError::UserNotFound)?;
        if !verify_password(&req.password_old, &row.password_hash) {
            return Err(ChangePasswordError::IncorrectOldPassword);
        }
        if req.password_new.is_empty() {
            return Err(ChangePasswordError::Invalid("new password must not be empty"));
        }
        let hash = hash_password(&req.password_new)?;
        if !self.users.update_password(user_id, &hash).await? {
            return Err(ChangePasswordError::UserNotFound);
        }
        tracing::info!(user_id = %user_id, "password_changed");
        Ok(())
    }
}
