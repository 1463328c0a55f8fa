/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct FileUploadDto {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUploadDto {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
