pub mod get_image;
pub mod list_images;
pub mod upload_image;

#[derive(thiserror::Error, Debug)]
pub enum ViewImageError {
    #[error("missing permission `view image`")]
    Forbidden,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
