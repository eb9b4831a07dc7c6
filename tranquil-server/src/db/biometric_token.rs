//! Biometric token entity
//!
//! Only the SHA3-256 hash of a token is ever stored. The raw value is handed
//! to the client once, at creation or rotation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use tranquil_core::{is_token_valid, token_expiry, verify_token, BiometricType, CoreError, RawToken};
use utoipa::ToSchema;
use uuid::Uuid;

/// Biometric token entity from database
#[derive(Debug, Clone, FromRow)]
pub struct BiometricToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_id: Uuid,
    pub token_hash: String,
    #[sqlx(try_from = "String")]
    pub biometric_type: BiometricType,
    pub challenge_attempts: i32,
    pub success_count: i32,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of checking a presented raw token against a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCheck {
    Valid,
    /// Inactive or past expiry
    Expired,
    Mismatch,
}

impl BiometricToken {
    /// Active and not past `expires_at` (a token without expiry never expires).
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        is_token_valid(self.is_active, self.expires_at, now)
    }

    /// Check a presented raw token. The hash comparison is constant-time,
    /// and a wrong secret is a mismatch whatever the token's state.
    pub fn check(&self, raw: &str, now: DateTime<Utc>) -> TokenCheck {
        if !verify_token(raw, &self.token_hash) {
            TokenCheck::Mismatch
        } else if !self.is_valid(now) {
            TokenCheck::Expired
        } else {
            TokenCheck::Valid
        }
    }
}

/// DTO for creating a new biometric token
#[derive(Debug, Clone)]
pub struct NewBiometricToken {
    pub user_id: Uuid,
    pub device_id: Uuid,
    pub biometric_type: BiometricType,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl NewBiometricToken {
    /// Generate a fresh raw token for a device and the row that stores its hash.
    pub fn issue(
        user_id: Uuid,
        device_id: Uuid,
        biometric_type: BiometricType,
        now: DateTime<Utc>,
    ) -> Result<(Self, RawToken), CoreError> {
        let raw = RawToken::generate()?;
        let input = Self {
            user_id,
            device_id,
            biometric_type,
            token_hash: raw.hash(),
            expires_at: token_expiry(now),
        };
        Ok((input, raw))
    }
}

/// Biometric token response DTO (never contains the hash)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BiometricTokenResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub device_id: Uuid,
    /// face_id | touch_id | fingerprint | face | iris
    #[schema(value_type = String, example = "face_id")]
    pub biometric_type: BiometricType,
    pub challenge_attempts: i32,
    pub success_count: i32,
    #[schema(value_type = Option<String>)]
    pub last_used_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    /// Active and unexpired at response time
    pub is_valid: bool,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<BiometricToken> for BiometricTokenResponse {
    fn from(token: BiometricToken) -> Self {
        let is_valid = token.is_valid(Utc::now());
        Self {
            id: token.id,
            device_id: token.device_id,
            biometric_type: token.biometric_type,
            challenge_attempts: token.challenge_attempts,
            success_count: token.success_count,
            last_used_at: token.last_used_at,
            expires_at: token.expires_at,
            is_active: token.is_active,
            is_valid,
            created_at: token.created_at,
        }
    }
}
