//! Shipping address route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use greencart_core::{
    AddressId, Envelope, NewAddress,
    envelope::payload::{AddressPayload, AddressesPayload, Empty},
};

use super::json::JsonBody;
use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddAddressRequest {
    pub address: NewAddress,
}

#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    JsonBody(body): JsonBody<AddAddressRequest>,
) -> Result<Json<Envelope<AddressPayload>>> {
    let valid = body.address.validate()?;
    let address = state.addresses().create(user_id, valid).await?;

    Ok(Json(Envelope::ok_with_message(
        "Address added",
        AddressPayload { address },
    )))
}

/// The caller's addresses, newest first.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Envelope<AddressesPayload>>> {
    let addresses = state.addresses().list_for_user(user_id).await?;
    Ok(Json(Envelope::ok(AddressesPayload { addresses })))
}

/// Delete one of the caller's addresses. Other users' addresses look absent.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<AddressId>,
) -> Result<Json<Envelope<Empty>>> {
    state
        .addresses()
        .delete(user_id, id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Address not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(Envelope::message("Address deleted")))
}
