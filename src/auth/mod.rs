use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::database::models::UserId;

/// Claims this service reads from tokens minted by the identity service
#[derive(Debug, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Option<UserId>,
    pub exp: i64,
}

/// Why a request failed authentication. The display text is the client message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Authentication failed")]
    Failed,
}

/// HS256 verifier built once from the shared secret
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; no grace period
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and expiry and return the caller's identity
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::Crypto(_) => {
                    tracing::error!("Token verification error: {}", e);
                    AuthError::Failed
                }
                _ => AuthError::Invalid,
            }
        })?;

        data.claims.user_id.ok_or_else(|| {
            tracing::error!("Token verification error: token has no userId claim");
            AuthError::Failed
        })
    }
}

/// Pull the credential out of an `Authorization` header value. A scheme
/// prefix such as `Bearer ` is optional; the second space-separated word is
/// the token when there is one.
pub fn extract_token(header: &str) -> Result<&str, AuthError> {
    if header.is_empty() {
        return Err(AuthError::MissingToken);
    }
    if header.contains(' ') {
        Ok(header.split(' ').nth(1).unwrap_or_default())
    } else {
        Ok(header)
    }
}
