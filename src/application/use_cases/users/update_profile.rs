use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::application::dto::uploads::FileUploadDto;
use crate::application::ports::image_repository::ImageRepository;
use crate::application::ports::storage_port::{StoragePort, StoredObject};
use crate::application::ports::user_repository::{
    ProfileUpdate, ProfileUpdateOutcome, UserRepository,
};
use crate::application::ports::verification_code_repository::VerificationCodeRepository;
use crate::application::services::uploads::{
    avatar_object_key, discard_if_unreferenced, resolve_content_type,
};
use crate::domain::auth::verification_code::MAX_FAILED_ATTEMPTS;
use crate::domain::users::image::{NewImage, file_type_of};
use crate::domain::users::user::{ProfileChanges, is_valid_email, normalize_email};

#[derive(thiserror::Error, Debug)]
pub enum UpdateProfileError {
    #[error("Error")]
    UserNotFound,
    #[error("{0}")]
    Invalid(&'static str),
    #[error("Email is already in use")]
    EmailInUse,
    #[error("Request authentication code")]
    CodeRequired,
    #[error("Incorrect code")]
    IncorrectCode,
    #[error("The verification code time has passed")]
    CodeExpired,
    #[error("Error")]
    Storage(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct UpdateProfile<'a, U, I, C, S>
where
    U: UserRepository + ?Sized,
    I: ImageRepository + ?Sized,
    C: VerificationCodeRepository + ?Sized,
    S: StoragePort + ?Sized,
{
    pub users: &'a U,
    pub images: &'a I,
    pub codes: &'a C,
    pub storage: &'a S,
    pub code_ttl: Duration,
}

/// Absent name/email fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileRequest {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<FileUploadDto>,
    pub removed_image: bool,
    pub code_verification: Option<String>,
}

impl<'a, U, I, C, S> UpdateProfile<'a, U, I, C, S>
where
    U: UserRepository + ?Sized,
    I: ImageRepository + ?Sized,
    C: VerificationCodeRepository + ?Sized,
    S: StoragePort + ?Sized,
{
    pub async fn execute(
        &self,
        user_id: Uuid,
        req: &UpdateProfileRequest,
    ) -> Result<(), UpdateProfileError> {
        let current = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(UpdateProfileError::UserNotFound)?
            .user;

        let email = req
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| current.email.clone());

        let consumed_code = if email != current.email {
            Some(self.check_email_change(user_id, &email, req).await?)
        } else {
            None
        };

        let uploaded = match req.avatar.as_ref().filter(|f| !f.is_empty()) {
            Some(file) => Some(self.upload_avatar(file).await?),
            None => None,
        };
        let uploaded_key = uploaded.as_ref().map(|(stored, _)| stored.key.clone());

        let update = ProfileUpdate {
            user_id,
            changes: ProfileChanges {
                firstname: pick(req.firstname.as_deref(), &current.firstname),
                lastname: pick(req.lastname.as_deref(), &current.lastname),
                email,
            },
            consume_code: consumed_code,
            replace_images: uploaded.is_some() || req.removed_image,
            new_image: uploaded.map(|(stored, content_type)| NewImage {
                user_id: Some(user_id),
                file_type: file_type_of(&stored.key),
                file_name: stored.key,
                content_type: Some(content_type),
                size: stored.size,
            }),
        };
        let failure = match self.users.apply_profile_update(&update).await {
            Ok(ProfileUpdateOutcome::Applied { removed_images }) => {
                for image in removed_images {
                    discard_if_unreferenced(self.images, self.storage, &image.file_name).await;
                }
                tracing::info!(
                    user_id = %user_id,
                    email_changed = consumed_code.is_some(),
                    "profile_updated"
                );
                return Ok(());
            }
            Ok(ProfileUpdateOutcome::UserNotFound) => UpdateProfileError::UserNotFound,
            Ok(ProfileUpdateOutcome::EmailTaken) => UpdateProfileError::EmailInUse,
            Ok(ProfileUpdateOutcome::CodeAlreadyUsed) => UpdateProfileError::IncorrectCode,
            Err(err) => err.into(),
        };
        if let Some(key) = &uploaded_key {
            discard_if_unreferenced(self.images, self.storage, key).await;
        }
        Err(failure)
    }

    /// Gate for switching to `new_email`. Returns the id of the code to consume.
    async fn check_email_change(
        &self,
        user_id: Uuid,
        new_email: &str,
        req: &UpdateProfileRequest,
    ) -> Result<Uuid, UpdateProfileError> {
        if !is_valid_email(new_email) {
            return Err(UpdateProfileError::Invalid("a valid email is required"));
        }
        if self.users.exists_by_email(new_email).await? {
            return Err(UpdateProfileError::EmailInUse);
        }
        let supplied = req
            .code_verification
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(UpdateProfileError::CodeRequired)?;
        let latest = self
            .codes
            .find_latest_for_user(user_id)
            .await?
            .ok_or(UpdateProfileError::IncorrectCode)?;
        if !latest.matches(supplied) {
            if latest.consumed_at.is_none() {
                let attempts = self
                    .codes
                    .record_failed_attempt(latest.id, MAX_FAILED_ATTEMPTS)
                    .await?;
                if attempts.is_some_and(|n| n >= MAX_FAILED_ATTEMPTS) {
                    tracing::warn!(user_id = %user_id, "verification_code_exhausted");
                }
            }
            return Err(UpdateProfileError::IncorrectCode);
        }
        if latest.is_expired(Utc::now(), self.code_ttl) {
            return Err(UpdateProfileError::CodeExpired);
        }
        Ok(latest.id)
    }

    async fn upload_avatar(
        &self,
        file: &FileUploadDto,
    ) -> Result<(StoredObject, String), UpdateProfileError> {
        let key = avatar_object_key(file.file_name.as_deref(), Utc::now());
        let content_type = resolve_content_type(file.content_type.as_deref(), &key);
        let stored = self
            .storage
            .put_object(&key, &file.bytes, Some(&content_type))
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, key = %key, "avatar_upload_failed");
                UpdateProfileError::Storage(err)
            })?;
        Ok((stored, content_type))
    }
}

fn pick(requested: Option<&str>, current: &str) -> String {
    requested
        .map(str::trim)
        .map(str::to_string)
        .unwrap_or_else(|| current.to_string())
}
