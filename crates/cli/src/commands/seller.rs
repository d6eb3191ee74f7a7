//! Seller account management.
//!
//! Seller access is a flag on an ordinary account; there is no sign-up flow
//! for it, so operators grant it here.

use greencart_core::Email;
use greencart_server::db::{NewUser, RepositoryError, UserRepository, users::PgUserRepository};
use greencart_server::services::auth::hash_password;
use thiserror::Error;

use super::connect;

/// Minimum password length, matching shopper registration.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during seller operations.
#[derive(Debug, Error)]
pub enum SellerError {
    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account with this email.
    #[error("No account with email: {0}")]
    NotFound(String),

    /// Account already exists.
    #[error("Account already exists with email: {0}")]
    UserExists(String),

    /// Password too short.
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,
}

fn parse_email(email: &str) -> Result<Email, SellerError> {
    Email::parse(email).map_err(|e| SellerError::InvalidEmail(e.to_string()))
}

/// Set or clear the seller flag on an existing account.
///
/// # Errors
///
/// Returns an error if the email is invalid, no account matches, or the
/// database fails.
pub async fn set_flag(email: &str, is_seller: bool) -> Result<(), Box<dyn std::error::Error>> {
    let email = parse_email(email)?;
    let users = PgUserRepository::new(connect().await?);

    let user = users
        .set_seller(&email, is_seller)
        .await
        .map_err(|e| -> Box<dyn std::error::Error> {
            match e {
                RepositoryError::NotFound => SellerError::NotFound(email.to_string()).into(),
                other => other.into(),
            }
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, is_seller, "Seller flag updated");
    Ok(())
}

/// Create a new seller account.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken, or the
/// database fails.
pub async fn create(email: &str, name: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = parse_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(SellerError::WeakPassword.into());
    }
    let password_hash = hash_password(password)?;

    let users = PgUserRepository::new(connect().await?);
    let user = users
        .create(NewUser {
            name: name.trim().to_owned(),
            email: email.clone(),
            password_hash,
            is_seller: true,
        })
        .await
        .map_err(|e| -> Box<dyn std::error::Error> {
            match e {
                RepositoryError::Conflict(_) => SellerError::UserExists(email.to_string()).into(),
                other => other.into(),
            }
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, "Seller created");
    Ok(())
}
