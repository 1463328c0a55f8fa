use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::use_cases::images::get_image::GetImage;
use crate::application::use_cases::images::list_images::ListImages;
use crate::application::use_cases::images::upload_image::{UploadImage, UploadImageRequest};
use crate::bootstrap::app_context::AppContext;
use crate::domain::users::image::Image;
use crate::presentation::http::auth::AuthUser;
use crate::presentation::http::error::{ApiError, ResponseMessage};
use crate::presentation::http::forms::read_multipart;

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageResponse {
    pub id: Uuid,
    pub file_name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ImageResponse {
    pub fn from_image(image: Image, public_base_url: Option<&str>) -> Self {
        let url = format!(
            "{}/api/image/{}",
            public_base_url.unwrap_or(""),
            urlencoding::encode(&image.file_name)
        );
        Self {
            id: image.id,
            file_name: image.file_name,
            file_type: image.file_type,
            content_type: image.content_type,
            size: image.size,
            url,
            created_at: image.created_at,
        }
    }
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadImageMultipart {
    name: Option<String>,
    /// Overrides the extension-derived type
    r#type: Option<String>,
    #[schema(value_type = String, format = Binary)]
    file: String,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/image", get(list_images).post(upload_image))
        .route("/image/:file_name", get(get_image))
        .with_state(ctx)
}

#[utoipa::path(
    post,
    path = "/api/image",
    tag = "Images",
    request_body(content = UploadImageMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Object key of the stored image", body = ResponseMessage),
        (status = 403, body = ResponseMessage)
    )
)]
pub async fn upload_image(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<Json<ResponseMessage>, ApiError> {
    let mut form = read_multipart(multipart, ctx.cfg.upload_max_bytes).await?;
    let file = form
        .take_file()
        .ok_or_else(|| ApiError::bad_request("file is required"))?;
    let req = UploadImageRequest {
        name: form.trimmed("name"),
        image_type: form.trimmed("type"),
        file,
    };

    let images = ctx.image_repo();
    let storage = ctx.storage_port();
    let roles = ctx.role_repo();
    let uc = UploadImage {
        images: images.as_ref(),
        storage: storage.as_ref(),
        roles: roles.as_ref(),
    };
    let image = uc.execute(user_id, &req).await?;
    tracing::info!(user_id = %user_id, key = %image.file_name, "image_uploaded");
    Ok(Json(ResponseMessage::ok(image.file_name)))
}

#[utoipa::path(
    get,
    path = "/api/image",
    tag = "Images",
    responses(
        (status = 200, body = [ImageResponse]),
        (status = 403, body = ResponseMessage)
    )
)]
pub async fn list_images(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ImageResponse>>, ApiError> {
    let images = ctx.image_repo();
    let roles = ctx.role_repo();
    let uc = ListImages {
        images: images.as_ref(),
        roles: roles.as_ref(),
    };
    let base = ctx.cfg.public_base_url.as_deref();
    let items = uc
        .execute(user_id)
        .await?
        .into_iter()
        .map(|img| ImageResponse::from_image(img, base))
        .collect();
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/image/{file_name}",
    tag = "Images",
    params(("file_name" = String, Path, description = "Object key")),
    responses(
        (status = 200, description = "OK", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 403, body = ResponseMessage),
        (status = 404, body = ResponseMessage)
    )
)]
pub async fn get_image(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    let images = ctx.image_repo();
    let storage = ctx.storage_port();
    let roles = ctx.role_repo();
    let uc = GetImage {
        images: images.as_ref(),
        storage: storage.as_ref(),
        roles: roles.as_ref(),
    };
    let content = uc
        .execute(user_id, &file_name)
        .await?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content.content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    Ok((headers, content.bytes).into_response())
}
