use chrono::{DateTime, Utc};

use crate::application::ports::image_repository::ImageRepository;
use crate::application::ports::storage_port::StoragePort;
use crate::domain::users::image::file_type_of;

pub fn sanitize_file_name(name: &str) -> String {
    let mut s = name.trim().to_string();
    let invalid = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];
    for ch in invalid {
        s = s.replace(ch, "-");
    }
    s = s.replace(' ', "_");
    while s.starts_with('.') {
        s.remove(0);
    }
    if s.len() > 100 {
        let mut cut = 100;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    if s.is_empty() {
        s = "file.bin".into();
    }
    s
}

/// Object key for an avatar: `<epoch-millis>-<sanitized name>`.
pub fn avatar_object_key(original: Option<&str>, now: DateTime<Utc>) -> String {
    let safe = sanitize_file_name(original.unwrap_or("avatar.bin"));
    format!("{}-{}", now.timestamp_millis(), safe)
}

/// Content type from the uploader, falling back to a guess from the extension.
pub fn resolve_content_type(declared: Option<&str>, key: &str) -> String {
    declared
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_ext(&file_type_of(key))
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
}

/// Deletes the object at `key` unless an image row still points at it.
/// Keys are shared when two uploads sanitize to the same name.
pub async fn discard_if_unreferenced<I, S>(images: &I, storage: &S, key: &str)
where
    I: ImageRepository + ?Sized,
    S: StoragePort + ?Sized,
{
    match images.count_by_file_name(key).await {
        Ok(0) => {
            if let Err(err) = storage.delete_object(key).await {
                tracing::warn!(error = ?err, key = %key, "image_object_delete_failed");
            }
        }
        Ok(refs) => tracing::debug!(key = %key, refs, "image_object_still_referenced"),
        Err(err) => tracing::warn!(error = ?err, key = %key, "image_refcount_failed"),
    }
}
