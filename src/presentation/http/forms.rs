use std::collections::HashMap;

use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::application::dto::uploads::FileUploadDto;
use crate::presentation::http::error::ApiError;

/// Text fields plus the optional `file` part of a multipart body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub file: Option<FileUploadDto>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Non-blank trimmed value.
    pub fn trimmed(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.fields.get(name).map(|v| parse_flag(v)).unwrap_or(false)
    }

    /// The uploaded file, ignoring the empty part browsers send when nothing was picked.
    pub fn take_file(&mut self) -> Option<FileUploadDto> {
        self.file.take().filter(|f| !f.is_empty())
    }
}

pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}

pub async fn read_multipart(
    mut multipart: Multipart,
    max_file_bytes: usize,
) -> Result<MultipartForm, ApiError> {
    let mut form = MultipartForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("malformed multipart body"))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        if name == "file" {
            let file_name = field.file_name().map(|s| s.to_string());
            let content_type = field.content_type().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::bad_request("malformed multipart body"))?;
            if data.len() > max_file_bytes {
                return Err(ApiError::new(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "file exceeds the upload limit",
                ));
            }
            form.file = Some(FileUploadDto {
                file_name: file_name.filter(|n| !n.trim().is_empty()),
                content_type,
                bytes: data.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|_| ApiError::bad_request("malformed multipart body"))?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}
