//! Authentication extractors.
//!
//! A request is authenticated by an `Authorization: Bearer <token>` header, or,
//! failing that, by the identity stored in its session cookie at login. Both
//! are checked for the role the endpoint needs.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tower_sessions::Session;

use greencart_core::UserId;

use crate::error::AppError;
use crate::models::{CurrentSeller, CurrentUser, session_keys};
use crate::services::auth::Role;
use crate::state::AppState;

const NOT_AUTHORIZED: &str = "Not authorized";

fn not_authorized() -> AppError {
    AppError::Unauthorized(NOT_AUTHORIZED.to_string())
}

/// The token from an `Authorization: Bearer` header, if any.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the caller for `role` from the bearer token, then the session.
///
/// A bearer token that is present but invalid is rejected outright. A valid
/// token for the other role does not decide anything: the session is still
/// checked, since one browser can be logged in as shopper and seller.
async fn authenticate(parts: &Parts, state: &AppState, role: Role) -> Result<UserId, AppError> {
    if let Some(token) = bearer_token(parts) {
        let claims = state.tokens().verify(token)?;
        if claims.role == role {
            return Ok(claims.sub);
        }
    }

    let Some(session) = parts.extensions.get::<Session>() else {
        return Err(not_authorized());
    };

    let id = match role {
        Role::User => session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await?
            .map(|u| u.id),
        Role::Seller => session
            .get::<CurrentSeller>(session_keys::CURRENT_SELLER)
            .await?
            .map(|s| s.id),
    };

    id.ok_or_else(not_authorized)
}

/// Extractor that requires a logged-in shopper.
///
/// Rejects with a `{ success: false, message: "Not authorized" }` envelope.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user_id): RequireUser) -> impl IntoResponse {
///     format!("Hello, {user_id}!")
/// }
/// ```
pub struct RequireUser(pub UserId);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, Role::User).await.map(Self)
    }
}

/// Extractor that requires a logged-in seller.
///
/// The seller flag is re-read from the database, so revoking it takes
/// effect immediately even for outstanding tokens.
pub struct RequireSeller(pub UserId);

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = authenticate(parts, state, Role::Seller).await?;

        match state.users().get_by_id(id).await? {
            Some(user) if user.is_seller => Ok(Self(id)),
            _ => Err(not_authorized()),
        }
    }
}

/// Helper to set the current shopper in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    // New identity, new session id.
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current shopper from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

/// Helper to set the current seller in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_seller(
    session: &Session,
    seller: CurrentSeller,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_SELLER, seller).await
}

/// Helper to clear the current seller from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_seller(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentSeller>(session_keys::CURRENT_SELLER)
        .await?;
    Ok(())
}
