use std::path::Path;

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Image {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    /// Object key inside the bucket.
    pub file_name: String,
    /// File extension taken from the uploaded name.
    pub file_type: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub user_id: Option<Uuid>,
    pub file_name: String,
    pub file_type: String,
    pub content_type: Option<String>,
    pub size: i64,
}

/// Extension of `file_name` without the dot, or an empty string.
pub fn file_type_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::file_type_of;

    #[test]
    fn file_type_is_last_extension() {
        assert_eq!(file_type_of("1700000000000-avatar.photo.PNG"), "png");
        assert_eq!(file_type_of("avatar.jpeg"), "jpeg");
        assert_eq!(file_type_of("README"), "");
    }
}
