use std::sync::Arc;

use crate::application::ports::code_notifier::CodeNotifier;
use crate::application::ports::image_repository::ImageRepository;
use crate::application::ports::role_repository::RoleRepository;
use crate::application::ports::storage_port::StoragePort;
use crate::application::ports::token_repository::TokenRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::application::ports::verification_code_repository::VerificationCodeRepository;
use crate::application::services::jwt::JwtService;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    user_repo: Arc<dyn UserRepository>,
    image_repo: Arc<dyn ImageRepository>,
    token_repo: Arc<dyn TokenRepository>,
    code_repo: Arc<dyn VerificationCodeRepository>,
    role_repo: Arc<dyn RoleRepository>,
    storage_port: Arc<dyn StoragePort>,
    notifier: Arc<dyn CodeNotifier>,
    jwt: Arc<JwtService>,
}

impl AppServices {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        image_repo: Arc<dyn ImageRepository>,
        token_repo: Arc<dyn TokenRepository>,
        code_repo: Arc<dyn VerificationCodeRepository>,
        role_repo: Arc<dyn RoleRepository>,
        storage_port: Arc<dyn StoragePort>,
        notifier: Arc<dyn CodeNotifier>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            user_repo,
            image_repo,
            token_repo,
            code_repo,
            role_repo,
            storage_port,
            notifier,
            jwt,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn user_repo(&self) -> Arc<dyn UserRepository> {
        self.services.user_repo.clone()
    }

    pub fn image_repo(&self) -> Arc<dyn ImageRepository> {
        self.services.image_repo.clone()
    }

    pub fn token_repo(&self) -> Arc<dyn TokenRepository> {
        self.services.token_repo.clone()
    }

    pub fn code_repo(&self) -> Arc<dyn VerificationCodeRepository> {
        self.services.code_repo.clone()
    }

    pub fn role_repo(&self) -> Arc<dyn RoleRepository> {
        self.services.role_repo.clone()
    }

    pub fn storage_port(&self) -> Arc<dyn StoragePort> {
        self.services.storage_port.clone()
    }

    pub fn notifier(&self) -> Arc<dyn CodeNotifier> {
        self.services.notifier.clone()
    }

    pub fn jwt(&self) -> Arc<JwtService> {
        self.services.jwt.clone()
    }

    pub fn verification_code_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cfg.verification_code_ttl_secs)
    }
}
