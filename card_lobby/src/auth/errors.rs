//! Authentication error types.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token in the Authorization header or query string
    #[error("Missing token")]
    MissingToken,

    /// Token failed signature, expiry or claim validation
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// Token decoded but carries an unusable user id
    #[error("Token carries invalid user id {0}")]
    InvalidUserId(i64),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak token structure
    pub fn client_message(&self) -> String {
        match self {
            AuthError::MissingToken => "Missing token".to_string(),
            _ => "Invalid token".to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
