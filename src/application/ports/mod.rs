pub mod code_notifier;
pub mod image_repository;
pub mod role_repository;
pub mod storage_port;
pub mod token_repository;
pub mod user_repository;
pub mod verification_code_repository;
