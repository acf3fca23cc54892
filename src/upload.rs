use std::fmt;

/// A file received from a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    NotAnImage,
    Empty,
}

impl UploadRejection {
    pub fn message(&self) -> &'static str {
        match self {
            UploadRejection::NotAnImage => "File must be an image",
            UploadRejection::Empty => "Empty file",
        }
    }
}

impl fmt::Display for UploadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for UploadRejection {}

/// Accepts uploads whose declared content type is `image/*` and whose body is
/// non-empty, handing the bytes back untouched.
pub fn validate(upload: UploadedImage) -> Result<Vec<u8>, UploadRejection> {
    let is_image = upload
        .content_type
        .as_deref()
        .map(|value| value.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false);
    if !is_image {
        return Err(UploadRejection::NotAnImage);
    }
    if upload.bytes.is_empty() {
        return Err(UploadRejection::Empty);
    }
    Ok(upload.bytes)
}
