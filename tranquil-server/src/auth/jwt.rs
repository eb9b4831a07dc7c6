//! Session tokens (HS256 JWT)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Session claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp, validated by jsonwebtoken)
    pub exp: i64,
    /// Device the session was opened from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<Uuid>,
}

/// Signing and verification keys derived from one shared secret
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, expiry_hours: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry: Duration::hours(i64::try_from(expiry_hours).unwrap_or(24)),
        }
    }

    /// Session lifetime in seconds, as reported to clients.
    pub fn expires_in(&self) -> i64 {
        self.expiry.num_seconds()
    }

    /// Issue a session token for a user, optionally bound to a device.
    pub fn issue(&self, user_id: Uuid, device_id: Option<Uuid>) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
            did: device_id,
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, ApiError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to create token: {}", e)))
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::auth_error("AUTH_TOKEN_EXPIRED", "JWT token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    ApiError::auth_error("AUTH_INVALID_TOKEN", "Invalid JWT signature")
                }
                _ => ApiError::auth_error(
                    "AUTH_INVALID_TOKEN",
                    format!("JWT validation failed: {}", e),
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(err: ApiError) -> String {
        match err {
            ApiError::AuthError { code, .. } => code,
            other => panic!("Expected AuthError, got: {:?}", other),
        }
    }

    #[test]
    fn test_issue_and_validate() {
        let keys = JwtKeys::new("test-secret", 24);
        let user_id = Uuid::new_v4();
        let device_id = Uuid::new_v4();

        let token = keys.issue(user_id, Some(device_id)).unwrap();
        let claims = keys.validate(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.did, Some(device_id));
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert_eq!(keys.expires_in(), 24 * 3600);
    }

    #[test]
    fn test_expired_token() {
        let keys = JwtKeys::new("test-secret", 24);
        let now = Utc::now().timestamp();
        let token = keys
            .encode(&Claims {
                sub: Uuid::new_v4(),
                iat: now - 7200,
                exp: now - 3600,
                did: None,
            })
            .unwrap();

        assert_eq!(code_of(keys.validate(&token).unwrap_err()), "AUTH_TOKEN_EXPIRED");
    }

    #[test]
    fn test_wrong_secret() {
        let token = JwtKeys::new("secret-a", 1).issue(Uuid::new_v4(), None).unwrap();
        let err = JwtKeys::new("secret-b", 1).validate(&token).unwrap_err();
        assert_eq!(code_of(err), "AUTH_INVALID_TOKEN");
    }

    #[test]
    fn test_garbage_token() {
        let keys = JwtKeys::new("test-secret", 1);
        assert_eq!(
            code_of(keys.validate("not-a-valid-jwt").unwrap_err()),
            "AUTH_INVALID_TOKEN"
        );
    }
}
