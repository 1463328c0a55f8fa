//! In-memory port implementations shared by use-case tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::code_notifier::CodeNotifier;
use crate::application::ports::image_repository::ImageRepository;
use crate::application::ports::role_repository::RoleRepository;
use crate::application::ports::storage_port::{StoragePort, StoredObject};
use crate::application::ports::token_repository::TokenRepository;
use crate::application::ports::user_repository::{
    CreateUserOutcome, ProfileUpdate, ProfileUpdateOutcome, UserRepository, UserRow,
};
use crate::application::ports::verification_code_repository::VerificationCodeRepository;
use crate::application::services::jwt::JwtService;
use crate::application::services::passwords::hash_password;
use crate::domain::auth::role::{
    PERM_UPLOAD_IMAGE, PERM_VIEW_IMAGE, PERM_VIEW_USER, Permission, Role,
};
use crate::domain::auth::token::{TokenKind, TokenRecord};
use crate::domain::auth::verification_code::{VerificationCode, generate_code};
use crate::domain::users::image::{Image, NewImage, file_type_of};
use crate::domain::users::user::{NewUser, User};

pub fn test_jwt() -> JwtService {
    JwtService::new("unit-test-secret-0123456789", 900, 3600)
}

#[derive(Default)]
struct State {
    users: Vec<UserRow>,
    images: Vec<Image>,
    tokens: Vec<TokenRecord>,
    codes: Vec<VerificationCode>,
    objects: HashMap<String, Vec<u8>>,
    sent: Vec<(String, String)>,
}

fn image_row(image: &NewImage, user_id: Option<Uuid>) -> Image {
    Image {
        id: Uuid::new_v4(),
        user_id,
        file_name: image.file_name.clone(),
        file_type: image.file_type.clone(),
        content_type: image.content_type.clone(),
        size: image.size,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    storage_down: AtomicBool,
    db_down: AtomicBool,
    stale_email_check: AtomicBool,
}

fn role_named(name: &str) -> Option<Role> {
    let perms: &[&str] = match name {
        "USER" => &[PERM_VIEW_IMAGE, PERM_UPLOAD_IMAGE],
        "ADMIN" => &[PERM_VIEW_USER, PERM_VIEW_IMAGE, PERM_UPLOAD_IMAGE],
        _ => return None,
    };
    Some(Role {
        name: name.to_string(),
        permissions: perms
            .iter()
            .map(|p| Permission {
                name: p.to_string(),
            })
            .collect(),
    })
}

impl InMemoryStore {
    pub fn fail_storage(&self, down: bool) {
        self.storage_down.store(down, Ordering::SeqCst);
    }

    /// Makes transactional user writes fail.
    pub fn fail_db(&self, down: bool) {
        self.db_down.store(down, Ordering::SeqCst);
    }

    /// `exists_by_email` answers false, as if a concurrent request claimed the
    /// email between the check and the write.
    pub fn stale_email_check(&self, stale: bool) {
        self.stale_email_check.store(stale, Ordering::SeqCst);
    }

    /// Creates a user directly; an empty `role` leaves the user without one.
    pub async fn seed_user(&self, email: &str, password: &str, role: &str) -> Uuid {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            firstname: "Test".into(),
            lastname: "User".into(),
            email: email.to_string(),
            role: (!role.is_empty()).then(|| role.to_string()),
            created_at: now,
            updated_at: now,
        };
        let id = user.id;
        let password_hash = hash_password(password).unwrap();
        self.state.lock().await.users.push(UserRow {
            user,
            password_hash,
        });
        id
    }

    /// Stores a code created `age` ago and returns its value.
    pub async fn seed_code(&self, user_id: Uuid, age: Duration) -> String {
        let code = VerificationCode {
            id: Uuid::new_v4(),
            user_id,
            code: generate_code(),
            created_at: Utc::now() - age,
            consumed_at: None,
            failed_attempts: 0,
        };
        let value = code.code.clone();
        self.state.lock().await.codes.push(code);
        value
    }

    pub async fn seed_image(&self, user_id: Uuid, key: &str) -> String {
        let mut st = self.state.lock().await;
        st.objects.insert(key.to_string(), b"\x89PNG".to_vec());
        st.images.push(Image {
            id: Uuid::new_v4(),
            user_id: Some(user_id),
            file_name: key.to_string(),
            file_type: file_type_of(key),
            content_type: None,
            size: 4,
            created_at: Utc::now(),
        });
        key.to_string()
    }

    pub async fn put_raw_object(&self, key: &str, bytes: &[u8]) {
        self.state
            .lock()
            .await
            .objects
            .insert(key.to_string(), bytes.to_vec());
    }

    pub async fn user_by_email(&self, email: &str) -> Option<UserRow> {
        let st = self.state.lock().await;
        st.users.iter().find(|r| r.user.email == email).cloned()
    }

    pub async fn images_of(&self, user_id: Uuid) -> Vec<Image> {
        let st = self.state.lock().await;
        st.images
            .iter()
            .filter(|i| i.user_id == Some(user_id))
            .cloned()
            .collect()
    }

    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().await.objects.get(key).cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.state.lock().await.objects.len()
    }

    pub async fn token(&self, token_hash: &str) -> Option<TokenRecord> {
        let st = self.state.lock().await;
        st.tokens.iter().find(|t| t.token_hash == token_hash).cloned()
    }

    pub async fn token_count(&self) -> usize {
        self.state.lock().await.tokens.len()
    }

    pub async fn sent_codes(&self) -> Vec<(String, String)> {
        self.state.lock().await.sent.clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        if self.stale_email_check.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.user_by_email(email).await.is_some())
    }

    async fn create_user(
        &self,
        new_user: &NewUser,
        avatar: Option<&NewImage>,
    ) -> anyhow::Result<CreateUserOutcome> {
        anyhow::ensure!(!self.db_down.load(Ordering::SeqCst), "database unavailable");
        let mut st = self.state.lock().await;
        if st.users.iter().any(|r| r.user.email == new_user.email) {
            return Ok(CreateUserOutcome::EmailTaken);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            firstname: new_user.firstname.clone(),
            lastname: new_user.lastname.clone(),
            email: new_user.email.clone(),
            role: Some(new_user.role.clone()),
            created_at: now,
            updated_at: now,
        };
        st.users.push(UserRow {
            user: user.clone(),
            password_hash: new_user.password_hash.clone(),
        });
        if let Some(image) = avatar {
            st.images.push(image_row(image, Some(user.id)));
        }
        Ok(CreateUserOutcome::Created(user))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>> {
        Ok(self.user_by_email(email).await)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRow>> {
        let st = self.state.lock().await;
        Ok(st.users.iter().find(|r| r.user.id == id).cloned())
    }

    async fn apply_profile_update(
        &self,
        update: &ProfileUpdate,
    ) -> anyhow::Result<ProfileUpdateOutcome> {
        anyhow::ensure!(!self.db_down.load(Ordering::SeqCst), "database unavailable");
        let mut st = self.state.lock().await;
        let changes = &update.changes;
        if !st.users.iter().any(|r| r.user.id == update.user_id) {
            return Ok(ProfileUpdateOutcome::UserNotFound);
        }
        if st
            .users
            .iter()
            .any(|r| r.user.id != update.user_id && r.user.email == changes.email)
        {
            return Ok(ProfileUpdateOutcome::EmailTaken);
        }
        // All checks run before the first mutation.
        if let Some(code_id) = update.consume_code {
            let usable = st
                .codes
                .iter()
                .any(|c| c.id == code_id && c.user_id == update.user_id && c.consumed_at.is_none());
            if !usable {
                return Ok(ProfileUpdateOutcome::CodeAlreadyUsed);
            }
        }

        let now = Utc::now();
        if let Some(row) = st.users.iter_mut().find(|r| r.user.id == update.user_id) {
            row.user.firstname = changes.firstname.clone();
            row.user.lastname = changes.lastname.clone();
            row.user.email = changes.email.clone();
            row.user.updated_at = now;
        }
        if let Some(code_id) = update.consume_code {
            if let Some(c) = st.codes.iter_mut().find(|c| c.id == code_id) {
                c.consumed_at = Some(now);
            }
        }
        let removed_images = if update.replace_images {
            let (removed, kept): (Vec<Image>, Vec<Image>) = st
                .images
                .drain(..)
                .partition(|i| i.user_id == Some(update.user_id));
            st.images = kept;
            removed
        } else {
            Vec::new()
        };
        if let Some(image) = &update.new_image {
            st.images.push(image_row(image, Some(update.user_id)));
        }
        Ok(ProfileUpdateOutcome::Applied { removed_images })
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let mut st = self.state.lock().await;
        match st.users.iter_mut().find(|r| r.user.id == id) {
            Some(row) => {
                row.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ImageRepository for InMemoryStore {
    async fn insert_image(&self, image: &NewImage) -> anyhow::Result<Image> {
        let row = image_row(image, image.user_id);
        self.state.lock().await.images.push(row.clone());
        Ok(row)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Image>> {
        Ok(self.state.lock().await.images.clone())
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Image>> {
        Ok(self.images_of(user_id).await)
    }

    async fn find_by_file_name(&self, file_name: &str) -> anyhow::Result<Option<Image>> {
        let st = self.state.lock().await;
        Ok(st.images.iter().find(|i| i.file_name == file_name).cloned())
    }

    async fn count_by_file_name(&self, file_name: &str) -> anyhow::Result<i64> {
        let st = self.state.lock().await;
        Ok(st.images.iter().filter(|i| i.file_name == file_name).count() as i64)
    }
}

#[async_trait]
impl TokenRepository for InMemoryStore {
    async fn save_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<TokenRecord> {
        let rec = TokenRecord {
            id: Uuid::new_v4(),
            user_id,
            token_hash: token_hash.to_string(),
            kind,
            expires_at,
            revoked: false,
        };
        self.state.lock().await.tokens.push(rec.clone());
        Ok(rec)
    }

    async fn find_by_hash(&self, token_hash: &str) -> anyhow::Result<Option<TokenRecord>> {
        Ok(self.token(token_hash).await)
    }

    async fn revoke(&self, token_id: Uuid) -> anyhow::Result<bool> {
        let mut st = self.state.lock().await;
        match st.tokens.iter_mut().find(|t| t.id == token_id && !t.revoked) {
            Some(t) => {
                t.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let now = Utc::now();
        let mut st = self.state.lock().await;
        let mut n = 0;
        for t in st
            .tokens
            .iter_mut()
            .filter(|t| t.user_id == user_id && t.is_active(now))
        {
            t.revoked = true;
            n += 1;
        }
        Ok(n)
    }
}

#[async_trait]
impl VerificationCodeRepository for InMemoryStore {
    async fn create_code(&self, user_id: Uuid, code: &str) -> anyhow::Result<VerificationCode> {
        let rec = VerificationCode {
            id: Uuid::new_v4(),
            user_id,
            code: code.to_string(),
            created_at: Utc::now(),
            consumed_at: None,
            failed_attempts: 0,
        };
        self.state.lock().await.codes.push(rec.clone());
        Ok(rec)
    }

    async fn find_latest_for_user(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<VerificationCode>> {
        let st = self.state.lock().await;
        Ok(st
            .codes
            .iter()
            .filter(|c| c.user_id == user_id)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn record_failed_attempt(
        &self,
        code_id: Uuid,
        max_attempts: i32,
    ) -> anyhow::Result<Option<i32>> {
        let mut st = self.state.lock().await;
        let Some(c) = st
            .codes
            .iter_mut()
            .find(|c| c.id == code_id && c.consumed_at.is_none())
        else {
            return Ok(None);
        };
        c.failed_attempts += 1;
        if c.failed_attempts >= max_attempts {
            c.consumed_at = Some(Utc::now());
        }
        Ok(Some(c.failed_attempts))
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn role_for_user(&self, user_id: Uuid) -> anyhow::Result<Option<Role>> {
        let st = self.state.lock().await;
        Ok(st
            .users
            .iter()
            .find(|r| r.user.id == user_id)
            .and_then(|r| r.user.role.as_deref())
            .and_then(role_named))
    }
}

#[async_trait]
impl StoragePort for InMemoryStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: &[u8],
        _content_type: Option<&str>,
    ) -> anyhow::Result<StoredObject> {
        anyhow::ensure!(!self.storage_down.load(Ordering::SeqCst), "storage unavailable");
        self.put_raw_object(key, bytes).await;
        Ok(StoredObject {
            key: key.to_string(),
            size: bytes.len() as i64,
        })
    }

    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        anyhow::ensure!(!self.storage_down.load(Ordering::SeqCst), "storage unavailable");
        Ok(self.object(key).await)
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        anyhow::ensure!(!self.storage_down.load(Ordering::SeqCst), "storage unavailable");
        self.state.lock().await.objects.remove(key);
        Ok(())
    }
}

#[async_trait]
impl CodeNotifier for InMemoryStore {
    async fn send_code(&self, user: &User, code: &str) -> anyhow::Result<()> {
        self.state
            .lock()
            .await
            .sent
            .push((user.email.clone(), code.to_string()));
        Ok(())
    }
}
