//! Database module for Tranquil Server
//!
//! Contains entities, storage traits, and the two storage backends:
//! - **PostgreSQL** (`postgres`): production storage, schema managed by sqlx migrations.
//! - **Memory** (`memory`): development and test fallback, data is lost on restart.
//!
//! Handlers only see `Arc<dyn Store>`, so both backends are interchangeable.

pub mod auth_log;
pub mod backup_code;
pub mod biometric_token;
pub mod device;
pub mod memory;
pub mod postgres;
pub mod trust_score;
pub mod user;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tranquil_core::{BiometricType, DeviceCapabilities, TrustScores};
use uuid::Uuid;

use crate::config::Config;

pub use auth_log::{AuthLog, NewAuthLog};
pub use backup_code::{BackupCode, BackupCodeRedemption, BackupCodeResponse, NewBackupCode};
pub use biometric_token::{BiometricToken, BiometricTokenResponse, NewBiometricToken, TokenCheck};
pub use device::{DeviceProfile, DeviceResponse, UserDevice};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use trust_score::DeviceTrustScore;
pub use user::{NewUser, UpdateUser, User, UserResponse};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Conflict(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(conflict_message(db_err.constraint()).to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Connection(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Serialization(err.to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// Client-facing message for a unique constraint violation.
pub(crate) fn conflict_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_email_key") => "Email is already registered",
        Some("user_devices_fingerprint_key") => "Device fingerprint is already registered",
        Some("biometric_tokens_active_idx") => {
            "An active biometric token already exists for this device and type"
        }
        _ => "Resource already exists",
    }
}

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` when the email is taken.
    async fn create_user(&self, input: NewUser) -> Result<User, StoreError>;

    /// Find a live (not soft-deleted) user by id.
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Find a live user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<User>, StoreError>;

    /// Soft delete: anonymises email and name, sets `deleted_at`, and
    /// deactivates the user's biometric tokens.
    async fn soft_delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Device and trust score persistence.
///
/// Every write derives `security_level` from the capabilities being stored
/// and clears `biometric_enabled` when the new capabilities no longer allow it.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Insert a device together with its default trust score.
    async fn register_device(
        &self,
        user_id: Uuid,
        fingerprint: &str,
        profile: &DeviceProfile,
        ip_address: Option<&str>,
    ) -> Result<UserDevice, StoreError>;

    async fn find_device(&self, id: Uuid) -> Result<Option<UserDevice>, StoreError>;

    async fn find_device_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<UserDevice>, StoreError>;

    /// Devices of a user, most recently seen first.
    async fn list_devices(&self, user_id: Uuid) -> Result<Vec<UserDevice>, StoreError>;

    /// Replace metadata and capabilities of an existing device and mark it seen.
    async fn refresh_device(
        &self,
        id: Uuid,
        profile: &DeviceProfile,
        ip_address: Option<&str>,
    ) -> Result<Option<UserDevice>, StoreError>;

    async fn update_capabilities(
        &self,
        id: Uuid,
        capabilities: &DeviceCapabilities,
    ) -> Result<Option<UserDevice>, StoreError>;

    /// Record that the device was seen now.
    async fn touch_device(
        &self,
        id: Uuid,
        ip_address: Option<&str>,
    ) -> Result<Option<UserDevice>, StoreError>;

    async fn set_device_trusted(
        &self,
        id: Uuid,
        trusted: bool,
    ) -> Result<Option<UserDevice>, StoreError>;

    /// Persist the biometric flag. Callers check eligibility first.
    async fn set_biometric_enabled(
        &self,
        id: Uuid,
        enabled: bool,
    ) -> Result<Option<UserDevice>, StoreError>;

    /// Remove a device with its trust score and tokens.
    async fn delete_device(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn get_trust_score(&self, device_id: Uuid)
        -> Result<Option<DeviceTrustScore>, StoreError>;

    async fn update_trust_score(
        &self,
        device_id: Uuid,
        scores: &TrustScores,
    ) -> Result<Option<DeviceTrustScore>, StoreError>;
}

/// Biometric token persistence. Raw tokens never reach this layer.
#[async_trait]
pub trait BiometricTokenStore: Send + Sync {
    /// Fails with `Conflict` when an active token exists for the device and type.
    async fn create_biometric_token(
        &self,
        input: NewBiometricToken,
    ) -> Result<BiometricToken, StoreError>;

    async fn find_biometric_token(&self, id: Uuid) -> Result<Option<BiometricToken>, StoreError>;

    async fn find_active_biometric_token(
        &self,
        device_id: Uuid,
        biometric_type: BiometricType,
    ) -> Result<Option<BiometricToken>, StoreError>;

    async fn list_biometric_tokens(
        &self,
        device_id: Uuid,
    ) -> Result<Vec<BiometricToken>, StoreError>;

    /// Swap in a new hash, reset the attempt counter and extend expiry.
    /// Only active tokens rotate.
    async fn rotate_biometric_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<BiometricToken>, StoreError>;

    /// Increment `challenge_attempts`.
    async fn record_token_attempt(&self, id: Uuid) -> Result<Option<BiometricToken>, StoreError>;

    /// Increment `success_count` and stamp `last_used_at`.
    async fn record_token_usage(&self, id: Uuid) -> Result<Option<BiometricToken>, StoreError>;

    async fn deactivate_biometric_token(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Deactivate every active token of a device, returning how many changed.
    async fn deactivate_device_tokens(&self, device_id: Uuid) -> Result<u64, StoreError>;
}

/// Append-only authentication audit trail.
#[async_trait]
pub trait AuthLogStore: Send + Sync {
    async fn append_auth_log(&self, entry: NewAuthLog) -> Result<AuthLog, StoreError>;

    /// Most recent entries first.
    async fn list_auth_logs(&self, user_id: Uuid, limit: i64) -> Result<Vec<AuthLog>, StoreError>;
}

/// One-time backup codes.
#[async_trait]
pub trait BackupCodeStore: Send + Sync {
    /// Drop the user's unused codes and insert a fresh batch.
    async fn replace_backup_codes(
        &self,
        user_id: Uuid,
        codes: Vec<NewBackupCode>,
    ) -> Result<Vec<BackupCode>, StoreError>;

    async fn list_backup_codes(&self, user_id: Uuid) -> Result<Vec<BackupCode>, StoreError>;

    /// Atomically mark a matching, unused, unexpired code as used.
    async fn redeem_backup_code(
        &self,
        user_id: Uuid,
        code_hash: &str,
    ) -> Result<BackupCodeRedemption, StoreError>;
}

/// Complete storage backend.
#[async_trait]
pub trait Store: UserStore + DeviceStore + BiometricTokenStore + AuthLogStore + BackupCodeStore {
    /// Backend name for health reporting.
    fn backend(&self) -> &'static str;

    /// Whether data survives a restart.
    fn is_persistent(&self) -> bool;

    async fn check_health(&self) -> Result<(), StoreError>;
}

/// Create storage from configuration.
///
/// Uses PostgreSQL (and runs migrations) if `DATABASE_URL` is set, otherwise falls back to memory.
pub async fn connect(config: &Config) -> Result<Arc<dyn Store>, StoreError> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Using PostgreSQL storage");
            let store = PgStore::connect(
                url,
                config.database_max_connections,
                config.database_min_connections,
            )
            .await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage - data will be lost on restart!");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
