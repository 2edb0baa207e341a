//! Authentication of incoming sockets.
//!
//! Accounts, password hashing and token issuance belong to the account
//! service. This module only checks a bearer token and yields the user id
//! that opened the socket:
//!
//! ```no_run
//! use card_lobby::auth::{JwtVerifier, TokenVerifier};
//!
//! let verifier = JwtVerifier::new("jwt_secret_of_at_least_thirty_two_chars");
//! let user_id = verifier.verify("eyJhbGciOiJIUzI1NiIs...")?;
//! # Ok::<(), card_lobby::auth::AuthError>(())
//! ```

pub mod errors;
pub mod verifier;

pub use errors::{AuthError, AuthResult};
pub use verifier::{AccessTokenClaims, JwtVerifier, TokenVerifier};
