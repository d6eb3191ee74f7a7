//! Client error types.

use thiserror::Error;

/// Errors from the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with a failure envelope.
    #[error("{0}")]
    Api(String),

    /// Transport failure or non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL could not be joined with an endpoint path.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Token file could not be read or written.
    #[error("Token store error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable holds an invalid value.
    #[error("Invalid environment variable {0}: {1}")]
    Config(String, String),
}

impl ClientError {
    /// Whether the server rejected the request, as opposed to being unreachable.
    #[must_use]
    pub const fn is_api(&self) -> bool {
        matches!(self, Self::Api(_))
    }
}
