//! Product image storage.
//!
//! Two backends implement [`MediaStore`]:
//!
//! - [`CloudinaryMediaStore`] uploads to a hosted CDN (selected by `CLOUDINARY_URL`)
//! - [`LocalMediaStore`] writes into the uploads directory served under `/images`

mod cloudinary;
mod local;

pub use cloudinary::CloudinaryMediaStore;
pub use local::LocalMediaStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ServerConfig;

/// Errors from the media store.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The upload is not an image.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// Local filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure talking to the hosted store.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The hosted store answered with an error.
    #[error("media store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// One uploaded image file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Reject anything that does not declare an `image/*` content type.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnsupportedType` for non-image uploads.
    pub fn ensure_image(&self) -> Result<(), MediaError> {
        match self.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/") => Ok(()),
            other => Err(MediaError::UnsupportedType(
                other.unwrap_or("unknown").to_owned(),
            )),
        }
    }

    /// File extension derived from the file name, falling back to the content type.
    #[must_use]
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext);
        let from_type = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.strip_prefix("image/"))
            .map(|sub| sub.split(['+', ';']).next().unwrap_or(sub));

        from_name
            .into_iter()
            .chain(from_type)
            .map(str::to_ascii_lowercase)
            .find(|ext| (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "img".to_owned())
    }
}

/// Somewhere to put product images.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store one image and return its public URL.
    async fn upload(&self, image: ImageUpload) -> Result<String, MediaError>;

    /// Check the store is usable.
    async fn ping(&self) -> Result<(), MediaError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Build the configured media store and verify it.
///
/// # Errors
///
/// Returns the backend's error if the start-up check fails.
pub async fn connect(config: &ServerConfig) -> Result<Arc<dyn MediaStore>, MediaError> {
    let store: Arc<dyn MediaStore> = match &config.cloudinary {
        Some(cloudinary) => Arc::new(CloudinaryMediaStore::new(cloudinary.clone())),
        None => Arc::new(LocalMediaStore::new(
            config.uploads_dir.clone(),
            config.public_url.clone(),
        )),
    };

    store.ping().await?;
    tracing::info!(backend = store.name(), "Media store connected");
    Ok(store)
}
