//! Shopper account route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use greencart_core::{
    Envelope,
    envelope::payload::{Empty, UserPayload},
};

use super::json::JsonBody;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthService, Role};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a shopper account and log it in.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<Json<Envelope<UserPayload>>> {
    let user = AuthService::new(state.users())
        .register(&body.name, &body.email, &body.password)
        .await?;

    let token = state.tokens().issue(user.id, Role::User)?;
    set_current_user(&session, CurrentUser { id: user.id }).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, "User registered");
    Ok(Json(Envelope::ok(UserPayload {
        user,
        token: Some(token),
    })))
}

/// Log in with email and password.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<Envelope<UserPayload>>> {
    let user = AuthService::new(state.users())
        .login(&body.email, &body.password)
        .await?;

    let token = state.tokens().issue(user.id, Role::User)?;
    set_current_user(&session, CurrentUser { id: user.id }).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(Envelope::ok(UserPayload {
        user,
        token: Some(token),
    })))
}

/// Return the logged-in shopper, cart included.
#[instrument(skip(state))]
pub async fn is_auth(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Envelope<UserPayload>>> {
    let user = state
        .users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(Envelope::ok(UserPayload { user, token: None })))
}

/// Forget the shopper in this session.
///
/// Bearer tokens are stateless; the client drops its copy.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Json<Envelope<Empty>>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(Envelope::message("Logged out")))
}
