use chrono::Utc;

use crate::application::dto::auth::AuthTokensDto;
use crate::application::dto::uploads::FileUploadDto;
use crate::application::ports::image_repository::ImageRepository;
use crate::application::ports::storage_port::StoragePort;
use crate::application::ports::token_repository::TokenRepository;
use crate::application::ports::user_repository::{CreateUserOutcome, UserRepository};
use crate::application::services::jwt::JwtService;
use crate::application::services::passwords::hash_password;
use crate::application::services::uploads::{
    avatar_object_key, discard_if_unreferenced, resolve_content_type,
};
use crate::application::use_cases::auth::tokens::issue_token_pair;
use crate::domain::auth::role::DEFAULT_ROLE;
use crate::domain::users::image::{NewImage, file_type_of};
use crate::domain::users::user::{NewUser, is_valid_email, normalize_email};

#[derive(thiserror::Error, Debug)]
pub enum RegisterError {
    #[error("email is already taken !")]
    EmailTaken,
    #[error("{0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct Register<'a, U, I, T, S>
where
    U: UserRepository + ?Sized,
    I: ImageRepository + ?Sized,
    T: TokenRepository + ?Sized,
    S: StoragePort + ?Sized,
{
    pub users: &'a U,
    pub images: &'a I,
    pub tokens: &'a T,
    pub storage: &'a S,
    pub jwt: &'a JwtService,
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<FileUploadDto>,
}

impl<'a, U, I, T, S> Register<'a, U, I, T, S>
where
    U: UserRepository + ?Sized,
    I: ImageRepository + ?Sized,
    T: TokenRepository + ?Sized,
    S: StoragePort + ?Sized,
{
    pub async fn execute(&self, req: &RegisterRequest) -> Result<AuthTokensDto, RegisterError> {
        let email = normalize_email(&req.email);
        if !is_valid_email(&email) {
            return Err(RegisterError::Invalid("a valid email is required"));
        }
        if req.password.is_empty() {
            return Err(RegisterError::Invalid("password must not be empty"));
        }
        if self.users.exists_by_email(&email).await? {
            return Err(RegisterError::EmailTaken);
        }

        let password_hash = hash_password(&req.password)?;

        let avatar = match req.avatar.as_ref().filter(|f| !f.is_empty()) {
            Some(file) => {
                let key = avatar_object_key(file.file_name.as_deref(), Utc::now());
                let content_type = resolve_content_type(file.content_type.as_deref(), &key);
                let stored = self
                    .storage
                    .put_object(&key, &file.bytes, Some(&content_type))
                    .await
                    .map_err(|err| {
                        tracing::error!(error = ?err, key = %key, "avatar_upload_failed");
                        err
                    })?;
                Some((stored, content_type))
            }
            None => None,
        };

        let new_user = NewUser {
            firstname: req.firstname.trim().to_string(),
            lastname: req.lastname.trim().to_string(),
            email,
            password_hash,
            role: DEFAULT_ROLE.to_string(),
        };
        let avatar_row = avatar.map(|(stored, content_type)| NewImage {
            user_id: None,
            file_type: file_type_of(&stored.key),
            file_name: stored.key,
            content_type: Some(content_type),
            size: stored.size,
        });
        let failure = match self.users.create_user(&new_user, avatar_row.as_ref()).await {
            Ok(CreateUserOutcome::Created(user)) => {
                let tokens = issue_token_pair(self.jwt, self.tokens, user.id).await?;
                tracing::info!(user_id = %user.id, "user_registered");
                return Ok(tokens);
            }
            Ok(CreateUserOutcome::EmailTaken) => RegisterError::EmailTaken,
            Err(err) => err.into(),
        };
        if let Some(image) = &avatar_row {
            discard_if_unreferenced(self.images, self.storage, &image.file_name).await;
        }
        Err(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::passwords::verify_password;
    use crate::application::use_cases::test_support::{InMemoryStore, test_jwt};
    use crate::domain::auth::token::{TokenKind, hash_token};

    fn request(email: &str, avatar: Option<FileUploadDto>) -> RegisterRequest {
        RegisterRequest {
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            email: email.into(),
            password: "engine".into(),
            avatar,
        }
    }

    fn png() -> FileUploadDto {
        FileUploadDto {
            file_name: Some("face.png".into()),
            content_type: Some("image/png".into()),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[tokio::test]
    async fn registers_user_with_avatar_and_tokens() {
        let store = InMemoryStore::default();
        let jwt = test_jwt();
        let uc = Register {
            users: &store,
            images: &store,
            tokens: &store,
            storage: &store,
            jwt: &jwt,
        };
        let out = uc
            .execute(&request("Ada@Example.com", Some(png())))
            .await
            .unwrap();

        let row = store.user_by_email("ada@example.com").await.unwrap();
        assert_eq!(row.user.id, out.user_id);
        assert!(verify_password("engine", &row.password_hash));
        assert_eq!(row.user.role.as_deref(), Some("USER"));

        let images = store.images_of(out.user_id).await;
        assert_eq!(images.len(), 1);
        assert!(images[0].file_name.ends_with("-face.png"));
        assert_eq!(images[0].file_type, "png");
        assert!(store.object(&images[0].file_name).await.is_some());

        let access = store.token(&hash_token(&out.access_token)).await.unwrap();
        assert_eq!(access.kind, TokenKind::Access);
        let refresh = store.token(&hash_token(&out.refresh_token)).await.unwrap();
        assert_eq!(refresh.kind, TokenKind::Refresh);
        jwt.decode(&out.access_token, TokenKind::Access).unwrap();
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryStore::default();
        store.seed_user("taken@example.com", "pw", "USER").await;
        let jwt = test_jwt();
        let uc = Register {
            users: &store,
            images: &store,
            tokens: &store,
            storage: &store,
            jwt: &jwt,
        };
        let err = uc
            .execute(&request(" TAKEN@example.com", Some(png())))
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::EmailTaken));
        assert_eq!(err.to_string(), "email is already taken !");
        assert_eq!(store.object_count().await, 0);
    }

    #[tokio::test]
    async fn avatar_is_optional() {
        let store = InMemoryStore::default();
        let jwt = test_jwt();
        let uc = Register {
            users: &store,
            images: &store,
            tokens: &store,
            storage: &store,
            jwt: &jwt,
        };
        let out = uc.execute(&request("solo@example.com", None)).await.unwrap();
        assert!(store.images_of(out.user_id).await.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_creates_no_user() {
        let store = InMemoryStore::default();
        store.fail_storage(true);
        let jwt = test_jwt();
        let uc = Register {
            users: &store,
            images: &store,
            tokens: &store,
            storage: &store,
            jwt: &jwt,
        };
        let err = uc
            .execute(&request("ada@example.com", Some(png())))
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::Internal(_)));
        assert!(store.user_by_email("ada@example.com").await.is_none());
    }

    #[tokio::test]
    async fn malformed_email_is_invalid() {
        let store = InMemoryStore::default();
        let jwt = test_jwt();
        let uc = Register {
            users: &store,
            images: &store,
            tokens: &store,
            storage: &store,
            jwt: &jwt,
        };
        let err = uc.execute(&request("nope", None)).await.unwrap_err();
        assert!(matches!(err, RegisterError::Invalid(_)));
    }

    #[tokio::test]
    async fn failed_insert_removes_uploaded_avatar() {
        let store = InMemoryStore::default();
        store.fail_db(true);
        let jwt = test_jwt();
        let uc = Register {
            users: &store,
            images: &store,
            tokens: &store,
            storage: &store,
            jwt: &jwt,
        };
        let err = uc
            .execute(&request("ada@example.com", Some(png())))
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::Internal(_)));
        assert_eq!(store.object_count().await, 0);
        assert_eq!(store.token_count().await, 0);
    }

    #[tokio::test]
    async fn email_claimed_after_check_is_taken() {
        let store = InMemoryStore::default();
        store.seed_user("ada@example.com", "pw", "USER").await;
        store.stale_email_check(true);
        let jwt = test_jwt();
        let uc = Register {
            users: &store,
            images: &store,
            tokens: &store,
            storage: &store,
            jwt: &jwt,
        };
        let err = uc
            .execute(&request("ada@example.com", Some(png())))
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::EmailTaken));
        assert_eq!(store.object_count().await, 0);
        assert_eq!(store.token_count().await, 0);
    }
}
