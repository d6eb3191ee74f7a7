//! Authentication service.
//!
//! Password registration and login for shoppers and sellers, plus the bearer
//! tokens issued after a successful login (see [`token`]).

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, Role, TokenService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use greencart_core::{Email, User};

use crate::db::{NewUser, RepositoryError, UserRepository};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserRepository,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserRepository) -> Self {
        Self { users }
    }

    /// Register a new shopper.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` for a blank name.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingField("name"));
        }
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        self.users
            .create(NewUser {
                name: name.to_owned(),
                email,
                password_hash,
                is_seller: false,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Login to the seller dashboard.
    ///
    /// # Errors
    ///
    /// Same as [`Self::login`], plus `AuthError::NotSeller` when the
    /// credentials are valid but the account lacks the seller flag.
    pub async fn seller_login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.login(email, password).await?;
        if !user.is_seller {
            return Err(AuthError::NotSeller);
        }
        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(validate_password("short"), Err(AuthError::WeakPassword(_))));
        assert!(validate_password("long enough").is_ok());
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let store = MemoryStore::default();
        let auth = AuthService::new(&store);

        let user = auth.register("Asha", "Asha@Example.com", "s3cure-pass").await.unwrap();
        assert_eq!(user.email.as_str(), "asha@example.com");
        assert!(!user.is_seller);

        assert!(matches!(
            auth.register("Asha", "asha@example.com", "s3cure-pass").await,
            Err(AuthError::UserAlreadyExists)
        ));

        let logged_in = auth.login("asha@example.com", "s3cure-pass").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(matches!(
            auth.login("asha@example.com", "nope-nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "s3cure-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_seller_login_requires_flag() {
        let store = MemoryStore::default();
        let auth = AuthService::new(&store);
        auth.register("Sam", "sam@example.com", "seller-pass").await.unwrap();

        assert!(matches!(
            auth.seller_login("sam@example.com", "seller-pass").await,
            Err(AuthError::NotSeller)
        ));

        let email = Email::parse("sam@example.com").unwrap();
        store.set_seller(&email, true).await.unwrap();
        assert!(auth.seller_login("sam@example.com", "seller-pass").await.unwrap().is_seller);
    }
}
