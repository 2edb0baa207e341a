//! Access token verification.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::errors::{AuthError, AuthResult};
use crate::ids::UserId;

/// Resolves a bearer token to the user that owns it.
///
/// Token issuance lives outside this crate; only verification is needed
/// before a socket is admitted.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> AuthResult<UserId>;
}

/// JWT claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(alias = "sub")]
    pub user_id: UserId,
    pub exp: i64,
}

/// HS256 JWT verifier
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier for tokens signed with `secret`
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Sign a token for `user_id` expiring at unix time `exp`.
    ///
    /// Used by tests and local tooling; production tokens come from the
    /// account service.
    pub fn issue(&self, user_id: UserId, exp: i64) -> AuthResult<String> {
        let claims = AccessTokenClaims { user_id, exp };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> AuthResult<UserId> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        // 0 never identifies a real account
        if data.claims.user_id <= 0 {
            return Err(AuthError::InvalidUserId(data.claims.user_id));
        }

        Ok(data.claims.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_for_testing_only_0123456789";

    fn in_one_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_verify_round_trip() {
        let verifier = JwtVerifier::new(SECRET);
        let token = verifier.issue(42, in_one_hour()).unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtVerifier::new("another_secret_key_that_is_long_enough");
        let token = issuer.issue(42, in_one_hour()).unwrap();

        let verifier = JwtVerifier::new(SECRET);
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = JwtVerifier::new(SECRET);
        let expired = chrono::Utc::now().timestamp() - 3600;
        let token = verifier.issue(42, expired).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_empty_token_is_missing() {
        let verifier = JwtVerifier::new(SECRET);
        assert!(matches!(verifier.verify(""), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_zero_user_id_rejected() {
        let verifier = JwtVerifier::new(SECRET);
        let token = verifier.issue(0, in_one_hour()).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidUserId(0))
        ));
    }

    #[test]
    fn test_sub_claim_accepted() {
        #[derive(Serialize)]
        struct SubClaims {
            sub: i64,
            exp: i64,
        }

        let token = encode(
            &Header::default(),
            &SubClaims {
                sub: 9,
                exp: in_one_hour(),
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(JwtVerifier::new(SECRET).verify(&token).unwrap(), 9);
    }
}
