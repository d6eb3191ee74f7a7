//! Signed bearer tokens (HS256).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use greencart_core::UserId;

use super::AuthError;

/// What a token lets its bearer do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shopper endpoints (cart, address, own orders).
    User,
    /// Seller endpoints (product management, all orders).
    Seller,
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies bearer tokens with one shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    /// Token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user_id` acting as `role`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id,
            role,
            iat: now,
            exp: now.saturating_add(ttl),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::TokenSigning)
    }

    /// Verify signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, forged or expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(secret: &str, ttl: Duration) -> TokenService {
        TokenService::new(&SecretString::from(secret.to_owned()), ttl)
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = service("q8V#t2Lm!9zR@4xK7pW$1nB6cY^3hJ0f", Duration::from_secs(3600));
        let token = tokens.issue(UserId::new(42), Role::Seller).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, UserId::new(42));
        assert_eq!(claims.role, Role::Seller);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_rejects_other_secret_and_garbage() {
        let issuer = service("q8V#t2Lm!9zR@4xK7pW$1nB6cY^3hJ0f", Duration::from_secs(3600));
        let other = service("Z1x!C2v@B3n#M4a$S5d%F6g^H7j&K8l*", Duration::from_secs(3600));
        let token = issuer.issue(UserId::new(1), Role::User).unwrap();
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(issuer.verify("not.a.token"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_rejects_expired() {
        let tokens = service("q8V#t2Lm!9zR@4xK7pW$1nB6cY^3hJ0f", Duration::from_secs(3600));
        let now = Utc::now().timestamp();
        let stale = Claims {
            sub: UserId::new(1),
            role: Role::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &stale, &tokens.encoding).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::InvalidToken)));
    }
}
