use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthTokensDto {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: Uuid,
}
