//! Images on local disk, served by the API under `/images`.

use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;
use uuid::Uuid;

use super::{ImageUpload, MediaError, MediaStore};

/// Writes images into a directory that the router serves at `/images`.
pub struct LocalMediaStore {
    dir: PathBuf,
    public_url: Url,
}

impl LocalMediaStore {
    #[must_use]
    pub const fn new(dir: PathBuf, public_url: Url) -> Self {
        Self { dir, public_url }
    }

    fn public_url_for(&self, file_name: &str) -> String {
        self.public_url
            .join(&format!("images/{file_name}"))
            .map_or_else(|_| format!("/images/{file_name}"), String::from)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, image: ImageUpload) -> Result<String, MediaError> {
        image.ensure_image()?;

        let file_name = format!("{}.{}", Uuid::new_v4(), image.extension());
        tokio::fs::write(self.dir.join(&file_name), &image.bytes).await?;

        tracing::debug!(%file_name, bytes = image.bytes.len(), "Stored image locally");
        Ok(self.public_url_for(&file_name))
    }

    async fn ping(&self) -> Result<(), MediaError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(
            dir.path().join("uploads"),
            Url::parse("http://localhost:5000").unwrap(),
        );
        store.ping().await.unwrap();

        let url = store
            .upload(ImageUpload {
                file_name: Some("apple.png".to_owned()),
                content_type: Some("image/png".to_owned()),
                bytes: b"png-bytes".to_vec(),
            })
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:5000/images/"));
        assert!(url.ends_with(".png"));
        let name = url.rsplit('/').next().unwrap();
        let stored = std::fs::read(dir.path().join("uploads").join(name)).unwrap();
        assert_eq!(stored, b"png-bytes");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path().to_path_buf(), Url::parse("http://x").unwrap());
        let result = store
            .upload(ImageUpload {
                file_name: Some("notes.txt".to_owned()),
                content_type: Some("text/plain".to_owned()),
                bytes: vec![],
            })
            .await;
        assert!(matches!(result, Err(MediaError::UnsupportedType(_))));
    }
}
