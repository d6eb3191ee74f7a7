//! Cloudinary upload API client.
//!
//! Uploads are signed: the request carries `sha256(params + api_secret)` as
//! hex, so the account must use SHA-256 signatures.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{ImageUpload, MediaError, MediaStore};
use crate::config::CloudinaryConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Folder images are uploaded into.
const FOLDER: &str = "greencart";

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Hosted image store.
pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryMediaStore {
    #[must_use]
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{API_BASE}/{}/{path}", self.config.cloud_name)
    }
}

/// Signature over the alphabetically sorted `key=value` pairs.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_unstable_by_key(|(key, _)| *key);

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, MediaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MediaError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload(&self, image: ImageUpload) -> Result<String, MediaError> {
        image.ensure_image()?;

        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", FOLDER), ("timestamp", &timestamp)],
            self.config.api_secret.expose_secret(),
        );

        let file_name = image
            .file_name
            .clone()
            .unwrap_or_else(|| format!("upload.{}", image.extension()));
        let mut part = Part::bytes(image.bytes).file_name(file_name);
        if let Some(content_type) = image.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", FOLDER)
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint("image/upload"))
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = check(response).await?.json().await?;

        tracing::debug!(url = %uploaded.secure_url, "Uploaded image to Cloudinary");
        Ok(uploaded.secure_url)
    }

    async fn ping(&self) -> Result<(), MediaError> {
        let response = self
            .client
            .get(self.endpoint("ping"))
            .basic_auth(
                &self.config.api_key,
                Some(self.config.api_secret.expose_secret()),
            )
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}
