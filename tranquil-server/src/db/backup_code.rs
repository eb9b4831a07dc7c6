//! Backup code entity

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use tranquil_core::{backup_code_expiry, is_redeemable, GeneratedBackupCode};
use utoipa::ToSchema;
use uuid::Uuid;

/// Backup code entity from database
#[derive(Debug, Clone, FromRow)]
pub struct BackupCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub code_partial: String,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl BackupCode {
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        is_redeemable(self.is_used, self.expires_at, now)
    }

    /// Classify why a matching code could not be redeemed.
    pub(crate) fn rejection(&self) -> BackupCodeRedemption {
        if self.is_used {
            BackupCodeRedemption::AlreadyUsed
        } else {
            BackupCodeRedemption::Expired
        }
    }
}

/// DTO for inserting a backup code
#[derive(Debug, Clone)]
pub struct NewBackupCode {
    pub code_hash: String,
    pub code_partial: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewBackupCode {
    pub fn from_generated(code: &GeneratedBackupCode, now: DateTime<Utc>) -> Self {
        Self {
            code_hash: code.hash().to_string(),
            code_partial: code.partial().to_string(),
            expires_at: Some(backup_code_expiry(now)),
        }
    }
}

/// Outcome of a redemption attempt
#[derive(Debug, Clone)]
pub enum BackupCodeRedemption {
    Redeemed(BackupCode),
    AlreadyUsed,
    Expired,
    NotFound,
}

/// Backup code response DTO (masked)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BackupCodeResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(example = "****-K7PM")]
    pub code_partial: String,
    pub is_used: bool,
    #[schema(value_type = Option<String>)]
    pub used_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub expires_at: Option<DateTime<Utc>>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<BackupCode> for BackupCodeResponse {
    fn from(code: BackupCode) -> Self {
        Self {
            id: code.id,
            code_partial: code.code_partial,
            is_used: code.is_used,
            used_at: code.used_at,
            expires_at: code.expires_at,
            created_at: code.created_at,
        }
    }
}
