//! Seller dashboard login.

use axum::{Json, extract::State};
use tower_sessions::Session;
use tracing::instrument;

use greencart_core::{
    Envelope,
    envelope::payload::{Empty, TokenPayload},
};

use super::json::JsonBody;
use super::user::LoginRequest;
use crate::error::{Result, set_sentry_user};
use crate::middleware::{RequireSeller, clear_current_seller, set_current_seller};
use crate::models::CurrentSeller;
use crate::services::auth::{AuthService, Role};
use crate::state::AppState;

/// Log in to the seller dashboard; the account must carry the seller flag.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<Envelope<TokenPayload>>> {
    let seller = AuthService::new(state.users())
        .seller_login(&body.email, &body.password)
        .await?;

    let token = state.tokens().issue(seller.id, Role::Seller)?;
    set_current_seller(&session, CurrentSeller { id: seller.id }).await?;
    set_sentry_user(&seller.id, Some(seller.email.as_str()));

    tracing::info!(seller_id = %seller.id, "Seller logged in");
    Ok(Json(Envelope::ok_with_message(
        "Logged in",
        TokenPayload { token },
    )))
}

#[instrument(skip_all)]
pub async fn is_auth(RequireSeller(_): RequireSeller) -> Json<Envelope<Empty>> {
    Json(Envelope::ok(Empty {}))
}

#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Json<Envelope<Empty>>> {
    clear_current_seller(&session).await?;
    Ok(Json(Envelope::message("Logged out")))
}
