use axum::{
    Form, Json, Router,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::access;
use crate::application::use_cases::users::change_password::{
    ChangePassword, ChangePasswordRequest as ChangePasswordDto,
};
use crate::application::use_cases::users::get_user::GetUser;
use crate::application::use_cases::users::request_verification_code::RequestVerificationCode;
use crate::application::use_cases::users::update_profile::{UpdateProfile, UpdateProfileRequest};
use crate::bootstrap::app_context::AppContext;
use crate::domain::users::user::UserProfile;
use crate::presentation::http::auth::AuthUser;
use crate::presentation::http::error::{ApiError, ResponseMessage};
use crate::presentation::http::forms::read_multipart;
use crate::presentation::http::images::ImageResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub role: Option<String>,
    pub images: Vec<ImageResponse>,
}

impl UserResponse {
    fn from_profile(profile: UserProfile, public_base_url: Option<&str>) -> Self {
        let user = profile.user;
        Self {
            id: user.id,
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
            role: user.role,
            images: profile
                .images
                .into_iter()
                .map(|img| ImageResponse::from_image(img, public_base_url))
                .collect(),
        }
    }
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UpdateProfileMultipart {
    firstname: Option<String>,
    lastname: Option<String>,
    email: Option<String>,
    /// New avatar; replaces every stored image
    #[schema(value_type = Option<String>, format = Binary)]
    file: Option<String>,
    removed_image: Option<bool>,
    /// Required when the email changes
    code_verification: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub password_old: String,
    pub password_new: String,
}

/// `ChangePasswordRequest` read from a urlencoded form or from multipart fields.
pub struct PasswordChangeForm(pub ChangePasswordRequest);

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

#[axum::async_trait]
impl<S> FromRequest<S> for PasswordChangeForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Form(body) = Form::<ChangePasswordRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            return Ok(Self(body));
        }
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        // No file part belongs in this form.
        let form = read_multipart(multipart, 0).await?;
        let field = |name: &str| {
            form.text(name)
                .ok_or_else(|| ApiError::bad_request(format!("missing field `{name}`")))
        };
        Ok(Self(ChangePasswordRequest {
            password_old: field("password_old")?,
            password_new: field("password_new")?,
        }))
    }
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/user", get(get_current_user).put(update_profile))
        .route("/user/:id", get(get_user_by_id))
        .route("/user/verification-code", post(request_verification_code))
        .route("/user/change-password", put(change_password))
        .with_state(ctx)
}

async fn load_profile(ctx: &AppContext, id: Uuid) -> Result<UserResponse, ApiError> {
    let users = ctx.user_repo();
    let images = ctx.image_repo();
    let uc = GetUser {
        users: users.as_ref(),
        images: images.as_ref(),
    };
    let profile = uc
        .execute(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(UserResponse::from_profile(
        profile,
        ctx.cfg.public_base_url.as_deref(),
    ))
}

#[utoipa::path(get, path = "/api/user", tag = "Users", responses((status = 200, body = UserResponse)))]
pub async fn get_current_user(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(load_profile(&ctx, user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, body = UserResponse),
        (status = 403, body = ResponseMessage),
        (status = 404, body = ResponseMessage)
    )
)]
pub async fn get_user_by_id(
    State(ctx): State<AppContext>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let roles = ctx.role_repo();
    if !access::can_view_user(roles.as_ref(), caller, id).await {
        return Err(ApiError::forbidden());
    }
    Ok(Json(load_profile(&ctx, id).await?))
}

/// Issues a fresh code that must accompany the next email change.
#[utoipa::path(
    post,
    path = "/api/user/verification-code",
    tag = "Users",
    responses((status = 200, body = ResponseMessage))
)]
pub async fn request_verification_code(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ResponseMessage>, ApiError> {
    let users = ctx.user_repo();
    let codes = ctx.code_repo();
    let notifier = ctx.notifier();
    let uc = RequestVerificationCode {
        users: users.as_ref(),
        codes: codes.as_ref(),
        notifier: notifier.as_ref(),
    };
    uc.execute(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Error"))?;
    Ok(Json(ResponseMessage::ok("Verification code sent")))
}

#[utoipa::path(
    put,
    path = "/api/user",
    tag = "Users",
    request_body(content = UpdateProfileMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = ResponseMessage),
        (status = 404, body = ResponseMessage),
        (status = 409, body = ResponseMessage)
    )
)]
pub async fn update_profile(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<Json<ResponseMessage>, ApiError> {
    let mut form = read_multipart(multipart, ctx.cfg.upload_max_bytes).await?;
    let req = UpdateProfileRequest {
        firstname: form.trimmed("firstname"),
        lastname: form.trimmed("lastname"),
        email: form.trimmed("email"),
        avatar: form.take_file(),
        removed_image: form.flag("removed_image"),
        code_verification: form.trimmed("code_verification"),
    };

    let users = ctx.user_repo();
    let images = ctx.image_repo();
    let codes = ctx.code_repo();
    let storage = ctx.storage_port();
    let uc = UpdateProfile {
        users: users.as_ref(),
        images: images.as_ref(),
        codes: codes.as_ref(),
        storage: storage.as_ref(),
        code_ttl: ctx.verification_code_ttl(),
    };
    uc.execute(user_id, &req).await?;
    Ok(Json(ResponseMessage::ok("Success")))
}

#[utoipa::path(
    put,
    path = "/api/user/change-password",
    tag = "Users",
    request_body(
        content = ChangePasswordRequest,
        description = "Also accepted as multipart/form-data",
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, body = ResponseMessage),
        (status = 400, description = "Malformed or incomplete form", body = ResponseMessage),
        (status = 404, description = "The old password is incorrect!", body = ResponseMessage)
    )
)]
pub async fn change_password(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    PasswordChangeForm(req): PasswordChangeForm,
) -> Result<Json<ResponseMessage>, ApiError> {
    let users = ctx.user_repo();
    let uc = ChangePassword {
        users: users.as_ref(),
    };
    let dto = ChangePasswordDto {
        password_old: req.password_old,
        password_new: req.password_new,
    };
    uc.execute(user_id, &dto).await?;
    Ok(Json(ResponseMessage::ok("Password changed successfully")))
}
