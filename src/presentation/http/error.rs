use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::use_cases::auth::authenticate::AuthenticateError;
use crate::application::use_cases::auth::refresh_token::RefreshError;
use crate::application::use_cases::auth::register::RegisterError;
use crate::application::use_cases::images::ViewImageError;
use crate::application::use_cases::images::upload_image::UploadImageError;
use crate::application::use_cases::users::change_password::ChangePasswordError;
use crate::application::use_cases::users::update_profile::UpdateProfileError;

/// Message envelope returned by every non-data endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResponseMessage {
    pub messages: Vec<String>,
    pub succeeded: bool,
}

impl ResponseMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
            succeeded: true,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
            succeeded: false,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "request_failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ResponseMessage::failed(self.message))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err)
    }
}

impl From<RegisterError> for ApiError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::EmailTaken => Self::new(StatusCode::CONFLICT, err.to_string()),
            RegisterError::Invalid(_) => Self::bad_request(err.to_string()),
            RegisterError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<AuthenticateError> for ApiError {
    fn from(err: AuthenticateError) -> Self {
        match err {
            AuthenticateError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, err.to_string())
            }
            AuthenticateError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::InvalidToken => Self::new(StatusCode::UNAUTHORIZED, err.to_string()),
            RefreshError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<UpdateProfileError> for ApiError {
    fn from(err: UpdateProfileError) -> Self {
        match err {
            UpdateProfileError::UserNotFound
            | UpdateProfileError::IncorrectCode
            | UpdateProfileError::CodeExpired => Self::not_found(err.to_string()),
            UpdateProfileError::EmailInUse | UpdateProfileError::CodeRequired => {
                Self::new(StatusCode::CONFLICT, err.to_string())
            }
            UpdateProfileError::Invalid(_) => Self::bad_request(err.to_string()),
            UpdateProfileError::Storage(e) | UpdateProfileError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<ChangePasswordError> for ApiError {
    fn from(err: ChangePasswordError) -> Self {
        match err {
            ChangePasswordError::UserNotFound | ChangePasswordError::IncorrectOldPassword => {
                Self::not_found(err.to_string())
            }
            ChangePasswordError::Invalid(_) => Self::bad_request(err.to_string()),
            ChangePasswordError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<UploadImageError> for ApiError {
    fn from(err: UploadImageError) -> Self {
        match err {
            UploadImageError::Forbidden => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            UploadImageError::EmptyFile => Self::bad_request(err.to_string()),
            UploadImageError::Storage(e) | UploadImageError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<ViewImageError> for ApiError {
    fn from(err: ViewImageError) -> Self {
        match err {
            ViewImageError::Forbidden => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            ViewImageError::Internal(e) => Self::internal(e),
        }
    }
}
