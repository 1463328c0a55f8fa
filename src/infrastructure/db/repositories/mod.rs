pub mod image_repository_sqlx;
pub mod role_repository_sqlx;
pub mod token_repository_sqlx;
pub mod user_repository_sqlx;
pub mod verification_code_repository_sqlx;
