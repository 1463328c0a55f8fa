use crate::application::dto::auth::AuthTokensDto;
use crate::application::ports::token_repository::TokenRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::jwt::JwtService;
use crate::application::services::passwords::verify_password;
use crate::application::use_cases::auth::tokens::issue_token_pair;
use crate::domain::users::user::normalize_email;

#[derive(thiserror::Error, Debug)]
pub enum AuthenticateError {
    #[error("Wrong email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct Authenticate<'a, U, T>
where
    U: UserRepository + ?Sized,
    T: TokenRepository + ?Sized,
{
    pub users: &'a U,
    pub tokens: &'a T,
    pub jwt: &'a JwtService,
}

#[derive(Debug, Clone)]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

impl<'a, U, T> Authenticate<'a, U, T>
where
    U: UserRepository + ?Sized,
    T: TokenRepository + ?Sized,
{
    pub async fn execute(
        &self,
        req: &AuthenticateRequest,
    ) -> Result<AuthTokensDto, AuthenticateError> {
        let row = match self.users.find_by_email(&normalize_email(&req.email)).await? {
            Some(r) => r,
            None => return Err(AuthenticateError::InvalidCredentials),
        };
        if !verify_password(&req.password, &row.password_hash) {
            tracing::info!(user_id = %row.user.id, "authentication_rejected");
            return Err(AuthenticateError::InvalidCredentials);
        }
        Ok(issue_token_pair(self.jwt, self.tokens, row.user.id).await?)
    }
}
