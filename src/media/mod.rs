use std::path::{Path, PathBuf};

use bytes::Bytes;
use derive_builder::Builder;
use image::ImageFormat;
use uuid::Uuid;

pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];

/// Directory under the media root that post images are written to.
const POSTS_DIR: &str = "posts";

#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Upload {
    #[must_use]
    pub fn builder() -> UploadBuilder {
        UploadBuilder::default()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    #[error("unsupported image type {0}")]
    UnsupportedType(String),

    #[error("empty image file")]
    Empty,

    #[error("file is not a JPEG, PNG or GIF image")]
    NotAnImage,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn is_allowed_image(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}

/// Checks the file signature, whatever content type the client claimed.
pub fn is_image_data(bytes: &[u8]) -> bool {
    matches!(
        image::guess_format(bytes),
        Ok(ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif)
    )
}

/// Post images on the local filesystem.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStorage {
    pub fn new(root: impl AsRef<Path>, url_prefix: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Writes the upload and returns its path relative to the media root.
    pub async fn save(&self, upload: &Upload) -> Result<String, MediaError> {
        if !is_allowed_image(&upload.content_type) {
            return Err(MediaError::UnsupportedType(upload.content_type.clone()));
        }

        if upload.bytes.is_empty() {
            return Err(MediaError::Empty);
        }

        if !is_image_data(&upload.bytes) {
            return Err(MediaError::NotAnImage);
        }

        tokio::fs::create_dir_all(self.root.join(POSTS_DIR)).await?;

        let path = format!(
            "{POSTS_DIR}/{}_{}",
            Uuid::now_v7(),
            sanitize_file_name(&upload.file_name)
        );

        tokio::fs::write(self.root.join(&path), &upload.bytes).await?;

        tracing::debug!("saved image {path}");

        Ok(path)
    }

    /// Removes a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, path: &str) -> Result<(), MediaError> {
        match tokio::fs::remove_file(self.root.join(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("image {path} already removed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.url_prefix, path)
    }
}

fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let name: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.trim_matches('.').is_empty() {
        String::from("image")
    } else {
        name
    }
}
