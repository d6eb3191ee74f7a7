//! Client configuration from environment variables.

use std::path::PathBuf;

use url::Url;

use crate::error::ClientError;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the GreenCart API
    pub api_url: Url,
    /// File the bearer token is persisted to; memory only when unset
    pub token_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Configuration for `api_url` with an in-memory token.
    #[must_use]
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            token_path: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `GREENCART_API_URL` and `GREENCART_TOKEN_PATH`, loading `.env`
    /// first if present.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if `GREENCART_API_URL` is not a URL.
    pub fn from_env() -> Result<Self, ClientError> {
        let _ = dotenvy::dotenv();

        let api_url = match std::env::var("GREENCART_API_URL") {
            Ok(value) if !value.trim().is_empty() => Url::parse(value.trim()).map_err(|e| {
                ClientError::Config("GREENCART_API_URL".to_owned(), e.to_string())
            })?,
            _ => Url::parse(DEFAULT_API_URL)?,
        };

        let token_path = std::env::var("GREENCART_TOKEN_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_url,
            token_path,
        })
    }
}
