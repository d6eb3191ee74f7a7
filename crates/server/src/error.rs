//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<Json<Envelope<_>>, AppError>`. Caller
//! mistakes (validation, authentication, missing records) become a failure
//! envelope with HTTP 200 so the client can show the message; server faults
//! are captured to Sentry and answered with a 5xx and a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use greencart_core::{Envelope, ValidationError, envelope::payload::Empty};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::media::MediaError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Media store operation failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Input failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Caller is not logged in with the required role.
    #[error("{0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error; caller mistakes keep 200.
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound | RepositoryError::Conflict(_)) => {
                StatusCode::OK
            }
            Self::Auth(err) if !err.is_internal() => StatusCode::OK,
            Self::Media(MediaError::UnsupportedType(_))
            | Self::Validation(_)
            | Self::NotFound(_)
            | Self::Unauthorized(_)
            | Self::BadRequest(_) => StatusCode::OK,
            Self::Media(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Auth(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Internal details never leave the server.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(what)) => what.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::MissingField(field) => format!("Missing details: {field}"),
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::UserAlreadyExists => "User already exists".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::NotSeller => "Not a seller account".to_string(),
                AuthError::InvalidToken => "Not authorized".to_string(),
                _ => "Internal server error".to_string(),
            },
            Self::Media(MediaError::UnsupportedType(ct)) => {
                format!("Only image uploads are allowed (got {ct})")
            }
            Self::Media(_) => "Image upload failed".to_string(),
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Validation(_) | Self::NotFound(_) | Self::Unauthorized(_) | Self::BadRequest(_) => {
                self.to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = Envelope::<Empty>::failure(self.public_message());
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_client_errors_keep_200() {
        let status = |err: AppError| err.into_response().status();

        assert_eq!(status(AppError::NotFound("Product not found".into())), StatusCode::OK);
        assert_eq!(status(AppError::Unauthorized("Not authorized".into())), StatusCode::OK);
        assert_eq!(status(AppError::Auth(AuthError::InvalidCredentials)), StatusCode::OK);
        assert_eq!(
            status(AppError::Validation(ValidationError::Missing("city"))),
            StatusCode::OK
        );
        assert_eq!(status(AppError::Database(RepositoryError::NotFound)), StatusCode::OK);
    }

    #[test]
    fn test_server_errors_use_5xx() {
        let status = |err: AppError| err.into_response().status();

        assert_eq!(
            status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AppError::Database(RepositoryError::DataCorruption("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AppError::Auth(AuthError::PasswordHash)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AppError::Media(MediaError::Rejected { status: 401, body: String::new() })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_failure_envelope_hides_internals() {
        let body = body_json(AppError::Internal("password=hunter2".into()).into_response()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Internal server error");

        let body = body_json(AppError::Validation(ValidationError::Missing("city")).into_response()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "city is required");
    }
}
