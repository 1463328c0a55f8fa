use axum::{
    Json, Router,
    extract::{FromRequestParts, Multipart, State},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    routing::post,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::dto::auth::AuthTokensDto;
use crate::application::use_cases::auth::authenticate::{
    Authenticate, AuthenticateRequest as AuthenticateDto,
};
use crate::application::use_cases::auth::logout::Logout;
use crate::application::use_cases::auth::refresh_token::RefreshToken;
use crate::application::use_cases::auth::register::{
    Register as RegisterUc, RegisterRequest as RegisterDto,
};
use crate::application::use_cases::auth::verify_access::VerifyAccess;
use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::error::{ApiError, ResponseMessage};
use crate::presentation::http::forms::read_multipart;

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RegisterMultipart {
    firstname: String,
    lastname: String,
    email: String,
    password: String,
    /// Optional avatar
    #[schema(value_type = Option<String>, format = Binary)]
    file: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthenticationResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: Uuid,
}

impl From<AuthTokensDto> for AuthenticationResponse {
    fn from(dto: AuthTokensDto) -> Self {
        Self {
            access_token: dto.access_token,
            refresh_token: dto.refresh_token,
            user_id: dto.user_id,
        }
    }
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/authenticate", post(authenticate))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
        .with_state(ctx)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body(content = RegisterMultipart, content_type = "multipart/form-data"),
    security(()),
    responses(
        (status = 200, body = AuthenticationResponse),
        (status = 409, description = "Email already taken", body = ResponseMessage)
    )
)]
pub async fn register(
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> Result<(HeaderMap, Json<AuthenticationResponse>), ApiError> {
    let mut form = read_multipart(multipart, ctx.cfg.upload_max_bytes).await?;
    let dto = RegisterDto {
        firstname: form.trimmed("firstname").unwrap_or_default(),
        lastname: form.trimmed("lastname").unwrap_or_default(),
        email: form.trimmed("email").unwrap_or_default(),
        password: form.text("password").unwrap_or_default(),
        avatar: form.take_file(),
    };

    let users = ctx.user_repo();
    let images = ctx.image_repo();
    let tokens = ctx.token_repo();
    let storage = ctx.storage_port();
    let jwt = ctx.jwt();
    let uc = RegisterUc {
        users: users.as_ref(),
        images: images.as_ref(),
        tokens: tokens.as_ref(),
        storage: storage.as_ref(),
        jwt: jwt.as_ref(),
    };
    let issued = uc.execute(&dto).await?;
    Ok(with_access_cookie(&ctx, issued))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/authenticate",
    tag = "Auth",
    request_body = AuthenticateRequest,
    security(()),
    responses(
        (status = 200, body = AuthenticationResponse),
        (status = 401, description = "Wrong email or password", body = ResponseMessage)
    )
)]
pub async fn authenticate(
    State(ctx): State<AppContext>,
    Json(req): Json<AuthenticateRequest>,
) -> Result<(HeaderMap, Json<AuthenticationResponse>), ApiError> {
    let users = ctx.user_repo();
    let tokens = ctx.token_repo();
    let jwt = ctx.jwt();
    let uc = Authenticate {
        users: users.as_ref(),
        tokens: tokens.as_ref(),
        jwt: jwt.as_ref(),
    };
    let dto = AuthenticateDto {
        email: req.email,
        password: req.password,
    };
    let issued = uc.execute(&dto).await?;
    Ok(with_access_cookie(&ctx, issued))
}

/// Exchanges the refresh token in the `Authorization` header for a new token pair.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh-token",
    tag = "Auth",
    responses(
        (status = 200, body = AuthenticationResponse),
        (status = 401, body = ResponseMessage)
    )
)]
pub async fn refresh_token(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<AuthenticationResponse>), ApiError> {
    let token = bearer_from_header(&headers).ok_or_else(ApiError::unauthorized)?;
    let users = ctx.user_repo();
    let tokens = ctx.token_repo();
    let jwt = ctx.jwt();
    let uc = RefreshToken {
        users: users.as_ref(),
        tokens: tokens.as_ref(),
        jwt: jwt.as_ref(),
    };
    let issued = uc.execute(token).await?;
    Ok(with_access_cookie(&ctx, issued))
}

#[utoipa::path(post, path = "/api/v1/auth/logout", tag = "Auth", responses((status = 204)))]
pub async fn logout(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
) -> Result<(HeaderMap, StatusCode), ApiError> {
    let tokens = ctx.token_repo();
    let uc = Logout {
        tokens: tokens.as_ref(),
    };
    uc.execute(user_id).await?;

    let mut headers = HeaderMap::new();
    let cookie = clear_access_cookie(cookie_is_secure(&ctx));
    if let Ok(v) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, v);
    }
    Ok((headers, StatusCode::NO_CONTENT))
}

fn with_access_cookie(
    ctx: &AppContext,
    issued: AuthTokensDto,
) -> (HeaderMap, Json<AuthenticationResponse>) {
    let mut headers = HeaderMap::new();
    let cookie = build_access_cookie(
        &issued.access_token,
        ctx.cfg.jwt_expires_secs,
        cookie_is_secure(ctx),
    );
    if let Ok(v) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, v);
    }
    (headers, Json(issued.into()))
}

fn cookie_is_secure(ctx: &AppContext) -> bool {
    ctx.cfg
        .frontend_url
        .as_deref()
        .map(|u| u.starts_with("https://"))
        .unwrap_or(false)
}

// --- Bearer extractor & authenticated caller ---

pub struct Bearer(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Bearer
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // 1) Prefer Authorization header if present
        if let Some(t) = bearer_from_header(&parts.headers) {
            return Ok(Bearer(t.to_string()));
        }

        // 2) Fallback to HttpOnly cookie `access_token`
        if let Some(cookie_hdr) = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            if let Some(token) = get_cookie(cookie_hdr, "access_token") {
                return Ok(Bearer(token));
            }
        }

        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Caller resolved from a live access token.
pub struct AuthUser(pub Uuid);

#[axum::async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let Bearer(token) = Bearer::from_request_parts(parts, ctx)
            .await
            .map_err(|_| ApiError::unauthorized())?;
        let tokens = ctx.token_repo();
        let jwt = ctx.jwt();
        let uc = VerifyAccess {
            tokens: tokens.as_ref(),
            jwt: jwt.as_ref(),
        };
        match uc.execute(&token).await {
            Ok(Some(user_id)) => Ok(AuthUser(user_id)),
            Ok(None) => Err(ApiError::unauthorized()),
            Err(e) => Err(ApiError::internal(e)),
        }
    }
}

fn bearer_from_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// --- Cookie helpers ---

fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        let kv = part.trim();
        if let Some((k, v)) = kv.split_once('=') {
            if k.trim() == name {
                return Some(v.trim().to_string());
            }
        }
    }
    None
}

fn build_access_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "access_token={}; HttpOnly{}; Path=/; Max-Age={}; SameSite=Lax",
        token,
        secure_attr,
        max_age_secs.max(0)
    )
}

fn clear_access_cookie(secure: bool) -> String {
    build_access_cookie("", 0, secure)
}
