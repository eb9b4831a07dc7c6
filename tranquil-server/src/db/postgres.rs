//! PostgreSQL storage backend
//!
//! Schema lives in `tranquil-server/migrations` and is applied at startup.
//! Scores are NUMERIC(5,2) columns, cast to float8 on the way out.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tranquil_core::{calculate_security_level, can_use_biometrics, BiometricType, DeviceCapabilities, TrustScores};
use uuid::Uuid;

use super::{
    AuthLog, AuthLogStore, BackupCode, BackupCodeRedemption, BackupCodeStore, BiometricToken,
    BiometricTokenStore, DeviceProfile, DeviceStore, DeviceTrustScore, NewAuthLog, NewBackupCode,
    NewBiometricToken, NewUser, Store, StoreError, UpdateUser, User, UserDevice, UserStore,
};

macro_rules! user_columns {
    () => {
        "id, email, password_hash, name, email_verified, created_at, updated_at, deleted_at"
    };
}

macro_rules! device_columns {
    () => {
        "id, user_id, fingerprint, name, platform, os_version, app_version, capabilities, \
         security_level, is_trusted, biometric_enabled, last_seen_at, last_ip, created_at, updated_at"
    };
}

macro_rules! token_columns {
    () => {
        "id, user_id, device_id, token_hash, biometric_type, challenge_attempts, success_count, \
         last_used_at, expires_at, is_active, created_at, updated_at"
    };
}

macro_rules! trust_score_columns {
    () => {
        "device_id, base_score::float8 AS base_score, behavior_score::float8 AS behavior_score, \
         location_score::float8 AS location_score, time_score::float8 AS time_score, \
         final_score::float8 AS final_score, updated_at"
    };
}

macro_rules! auth_log_columns {
    () => {
        "id, user_id, device_id, auth_method, result, failure_reason, ip_address, user_agent, \
         trust_score_at_time::float8 AS trust_score_at_time, created_at"
    };
}

macro_rules! backup_code_columns {
    () => {
        "id, user_id, code_hash, code_partial, is_used, used_at, expires_at, created_at"
    };
}

/// PostgreSQL-backed storage
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// SQL for soft delete with PII anonymization
    const SOFT_DELETE_SQL: &'static str = r#"
        UPDATE users
        SET
            email = 'deleted-' || id::text,
            name = NULL,
            deleted_at = NOW(),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
    "#;

    /// Mark a matching code used only if it is still redeemable
    const REDEEM_SQL: &'static str = concat!(
        r#"
        UPDATE backup_codes
        SET is_used = TRUE, used_at = NOW()
        WHERE user_id = $1
          AND code_hash = $2
          AND is_used = FALSE
          AND (expires_at IS NULL OR expires_at > NOW())
        RETURNING "#,
        backup_code_columns!()
    );

    /// Connect with a bounded pool
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections.min(max_connections))
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(
            max_connections,
            min_connections,
            "Connected to PostgreSQL database"
        );
        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        tracing::info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, input: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(concat!(
            r#"
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING "#,
            user_columns!()
        ))
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(concat!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING "#,
            user_columns!()
        ))
        .bind(id)
        .bind(&input.name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn soft_delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(Self::SOFT_DELETE_SQL)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let revoked = sqlx::query(
            r#"
            UPDATE biometric_tokens
            SET is_active = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Frees the fingerprints; scores and tokens cascade, audit rows keep a NULL device
        let removed = sqlx::query("DELETE FROM user_devices WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            user_id = %id,
            revoked = revoked.rows_affected(),
            devices_removed = removed.rows_affected(),
            "User soft-deleted"
        );
        Ok(true)
    }
}

/// Derived columns written alongside a capability set.
fn derived(capabilities: &DeviceCapabilities) -> (&'static str, bool) {
    let level = calculate_security_level(capabilities);
    (level.as_str(), can_use_biometrics(capabilities, true, level))
}

#[async_trait]
impl DeviceStore for PgStore {
    async fn register_device(
        &self,
        user_id: Uuid,
        fingerprint: &str,
        profile: &DeviceProfile,
        ip_address: Option<&str>,
    ) -> Result<UserDevice, StoreError> {
        let (level, _) = derived(&profile.capabilities);
        let mut tx = self.pool.begin().await?;

        let device = sqlx::query_as::<_, UserDevice>(concat!(
            r#"
            INSERT INTO user_devices
                (user_id, fingerprint, name, platform, os_version, app_version,
                 capabilities, security_level, last_seen_at, last_ip)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), $9)
            RETURNING "#,
            device_columns!()
        ))
        .bind(user_id)
        .bind(fingerprint)
        .bind(&profile.name)
        .bind(&profile.platform)
        .bind(&profile.os_version)
        .bind(&profile.app_version)
        .bind(Json(&profile.capabilities))
        .bind(level)
        .bind(ip_address)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO device_trust_scores (device_id) VALUES ($1)")
            .bind(device.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(device)
    }

    async fn find_device(&self, id: Uuid) -> Result<Option<UserDevice>, StoreError> {
        let device = sqlx::query_as::<_, UserDevice>(concat!(
            "SELECT ",
            device_columns!(),
            " FROM user_devices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn find_device_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<UserDevice>, StoreError> {
        let device = sqlx::query_as::<_, UserDevice>(concat!(
            "SELECT ",
            device_columns!(),
            " FROM user_devices WHERE fingerprint = $1"
        ))
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn list_devices(&self, user_id: Uuid) -> Result<Vec<UserDevice>, StoreError> {
        let devices = sqlx::query_as::<_, UserDevice>(concat!(
            "SELECT ",
            device_columns!(),
            r#"
            FROM user_devices
            WHERE user_id = $1
            ORDER BY last_seen_at DESC NULLS LAST, created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(devices)
    }

    async fn refresh_device(
        &self,
        id: Uuid,
        profile: &DeviceProfile,
        ip_address: Option<&str>,
    ) -> Result<Option<UserDevice>, StoreError> {
        let (level, biometrics_allowed) = derived(&profile.capabilities);

        let device = sqlx::query_as::<_, UserDevice>(concat!(
            r#"
            UPDATE user_devices
            SET
                name = COALESCE($2, name),
                platform = COALESCE($3, platform),
                os_version = COALESCE($4, os_version),
                app_version = COALESCE($5, app_version),
                capabilities = $6,
                security_level = $7,
                biometric_enabled = biometric_enabled AND $8,
                last_seen_at = NOW(),
                last_ip = COALESCE($9, last_ip),
                updated_at = NOW()
            WHERE id = $1
            RETURNING "#,
            device_columns!()
        ))
        .bind(id)
        .bind(&profile.name)
        .bind(&profile.platform)
        .bind(&profile.os_version)
        .bind(&profile.app_version)
        .bind(Json(&profile.capabilities))
        .bind(level)
        .bind(biometrics_allowed)
        .bind(ip_address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn update_capabilities(
        &self,
        id: Uuid,
        capabilities: &DeviceCapabilities,
    ) -> Result<Option<UserDevice>, StoreError> {
        let (level, biometrics_allowed) = derived(capabilities);

        let device = sqlx::query_as::<_, UserDevice>(concat!(
            r#"
            UPDATE user_devices
            SET
                capabilities = $2,
                security_level = $3,
                biometric_enabled = biometric_enabled AND $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING "#,
            device_columns!()
        ))
        .bind(id)
        .bind(Json(capabilities))
        .bind(level)
        .bind(biometrics_allowed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn touch_device(
        &self,
        id: Uuid,
        ip_address: Option<&str>,
    ) -> Result<Option<UserDevice>, StoreError> {
        let device = sqlx::query_as::<_, UserDevice>(concat!(
            r#"
            UPDATE user_devices
            SET last_seen_at = NOW(), last_ip = COALESCE($2, last_ip), updated_at = NOW()
            WHERE id = $1
            RETURNING "#,
            device_columns!()
        ))
        .bind(id)
        .bind(ip_address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn set_device_trusted(
        &self,
        id: Uuid,
        trusted: bool,
    ) -> Result<Option<UserDevice>, StoreError> {
        let device = sqlx::query_as::<_, UserDevice>(concat!(
            r#"
            UPDATE user_devices
            SET is_trusted = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING "#,
            device_columns!()
        ))
        .bind(id)
        .bind(trusted)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn set_biometric_enabled(
        &self,
        id: Uuid,
        enabled: bool,
    ) -> Result<Option<UserDevice>, StoreError> {
        let device = sqlx::query_as::<_, UserDevice>(concat!(
            r#"
            UPDATE user_devices
            SET biometric_enabled = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING "#,
            device_columns!()
        ))
        .bind(id)
        .bind(enabled)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn delete_device(&self, id: Uuid) -> Result<bool, StoreError> {
        // Trust score and tokens go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM user_devices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_trust_score(
        &self,
        device_id: Uuid,
    ) -> Result<Option<DeviceTrustScore>, StoreError> {
        let score = sqlx::query_as::<_, DeviceTrustScore>(concat!(
            "SELECT ",
            trust_score_columns!(),
            " FROM device_trust_scores WHERE device_id = $1"
        ))
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(score)
    }

    async fn update_trust_score(
        &self,
        device_id: Uuid,
        scores: &TrustScores,
    ) -> Result<Option<DeviceTrustScore>, StoreError> {
        let score = sqlx::query_as::<_, DeviceTrustScore>(concat!(
            r#"
            UPDATE device_trust_scores
            SET
                base_score = $2::numeric,
                behavior_score = $3::numeric,
                location_score = $4::numeric,
                time_score = $5::numeric,
                final_score = $6::numeric,
                updated_at = NOW()
            WHERE device_id = $1
            RETURNING "#,
            trust_score_columns!()
        ))
        .bind(device_id)
        .bind(scores.base_score)
        .bind(scores.behavior_score)
        .bind(scores.location_score)
        .bind(scores.time_score)
        .bind(scores.final_score)
        .fetch_optional(&self.pool)
        .await?;
        Ok(score)
    }
}

#[async_trait]
impl BiometricTokenStore for PgStore {
    async fn create_biometric_token(
        &self,
        input: NewBiometricToken,
    ) -> Result<BiometricToken, StoreError> {
        let token = sqlx::query_as::<_, BiometricToken>(concat!(
            r#"
            INSERT INTO biometric_tokens
                (user_id, device_id, token_hash, biometric_type, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING "#,
            token_columns!()
        ))
        .bind(input.user_id)
        .bind(input.device_id)
        .bind(&input.token_hash)
        .bind(input.biometric_type.as_str())
        .bind(input.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(token)
    }

    async fn find_biometric_token(&self, id: Uuid) -> Result<Option<BiometricToken>, StoreError> {
        let token = sqlx::query_as::<_, BiometricToken>(concat!(
            "SELECT ",
            token_columns!(),
            " FROM biometric_tokens WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn find_active_biometric_token(
        &self,
        device_id: Uuid,
        biometric_type: BiometricType,
    ) -> Result<Option<BiometricToken>, StoreError> {
        let token = sqlx::query_as::<_, BiometricToken>(concat!(
            "SELECT ",
            token_columns!(),
            " FROM biometric_tokens WHERE device_id = $1 AND biometric_type = $2 AND is_active"
        ))
        .bind(device_id)
        .bind(biometric_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn list_biometric_tokens(
        &self,
        device_id: Uuid,
    ) -> Result<Vec<BiometricToken>, StoreError> {
        let tokens = sqlx::query_as::<_, BiometricToken>(concat!(
            "SELECT ",
            token_columns!(),
            " FROM biometric_tokens WHERE device_id = $1 ORDER BY created_at DESC"
        ))
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tokens)
    }

    async fn rotate_biometric_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<BiometricToken>, StoreError> {
        let token = sqlx::query_as::<_, BiometricToken>(concat!(
            r#"
            UPDATE biometric_tokens
            SET token_hash = $2, challenge_attempts = 0, expires_at = $3, updated_at = NOW()
            WHERE id = $1 AND is_active
            RETURNING "#,
            token_columns!()
        ))
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn record_token_attempt(&self, id: Uuid) -> Result<Option<BiometricToken>, StoreError> {
        let token = sqlx::query_as::<_, BiometricToken>(concat!(
            r#"
            UPDATE biometric_tokens
            SET challenge_attempts = challenge_attempts + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING "#,
            token_columns!()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn record_token_usage(&self, id: Uuid) -> Result<Option<BiometricToken>, StoreError> {
        let token = sqlx::query_as::<_, BiometricToken>(concat!(
            r#"
            UPDATE biometric_tokens
            SET success_count = success_count + 1, last_used_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING "#,
            token_columns!()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn deactivate_biometric_token(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE biometric_tokens
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_device_tokens(&self, device_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE biometric_tokens
            SET is_active = FALSE, updated_at = NOW()
            WHERE device_id = $1 AND is_active
            "#,
        )
        .bind(device_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl AuthLogStore for PgStore {
    async fn append_auth_log(&self, entry: NewAuthLog) -> Result<AuthLog, StoreError> {
        let log = sqlx::query_as::<_, AuthLog>(concat!(
            r#"
            INSERT INTO auth_logs
                (user_id, device_id, auth_method, result, failure_reason,
                 ip_address, user_agent, trust_score_at_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8::numeric)
            RETURNING "#,
            auth_log_columns!()
        ))
        .bind(entry.user_id)
        .bind(entry.device_id)
        .bind(entry.auth_method.as_str())
        .bind(entry.result.as_str())
        .bind(entry.failure_reason.map(|r| r.as_str()))
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.trust_score_at_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(log)
    }

    async fn list_auth_logs(&self, user_id: Uuid, limit: i64) -> Result<Vec<AuthLog>, StoreError> {
        let logs = sqlx::query_as::<_, AuthLog>(concat!(
            "SELECT ",
            auth_log_columns!(),
            r#"
            FROM auth_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}

#[async_trait]
impl BackupCodeStore for PgStore {
    async fn replace_backup_codes(
        &self,
        user_id: Uuid,
        codes: Vec<NewBackupCode>,
    ) -> Result<Vec<BackupCode>, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM backup_codes WHERE user_id = $1 AND is_used = FALSE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(codes.len());
        for code in codes {
            let row = sqlx::query_as::<_, BackupCode>(concat!(
                r#"
                INSERT INTO backup_codes (user_id, code_hash, code_partial, expires_at)
                VALUES ($1, $2, $3, $4)
                RETURNING "#,
                backup_code_columns!()
            ))
            .bind(user_id)
            .bind(&code.code_hash)
            .bind(&code.code_partial)
            .bind(code.expires_at)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn list_backup_codes(&self, user_id: Uuid) -> Result<Vec<BackupCode>, StoreError> {
        let codes = sqlx::query_as::<_, BackupCode>(concat!(
            "SELECT ",
            backup_code_columns!(),
            " FROM backup_codes WHERE user_id = $1 ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(codes)
    }

    async fn redeem_backup_code(
        &self,
        user_id: Uuid,
        code_hash: &str,
    ) -> Result<BackupCodeRedemption, StoreError> {
        let redeemed = sqlx::query_as::<_, BackupCode>(Self::REDEEM_SQL)
            .bind(user_id)
            .bind(code_hash)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(code) = redeemed {
            return Ok(BackupCodeRedemption::Redeemed(code));
        }

        // Nothing redeemable: find out why for the audit trail
        let existing = sqlx::query_as::<_, BackupCode>(concat!(
            "SELECT ",
            backup_code_columns!(),
            r#"
            FROM backup_codes
            WHERE user_id = $1 AND code_hash = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(code_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing.map_or(BackupCodeRedemption::NotFound, |code| code.rejection()))
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn is_persistent(&self) -> bool {
        true
    }

    /// Check database connection health
    async fn check_health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_delete_sql_anonymizes_pii() {
        assert!(
            PgStore::SOFT_DELETE_SQL.contains("email = 'deleted-' || id::text"),
            "soft_delete must anonymize email with 'deleted-{{id}}' pattern"
        );
        assert!(PgStore::SOFT_DELETE_SQL.contains("name = NULL"));
        assert!(PgStore::SOFT_DELETE_SQL.contains("deleted_at = NOW()"));
    }

    #[test]
    fn test_redeem_sql_is_single_guarded_update() {
        assert!(PgStore::REDEEM_SQL.contains("is_used = FALSE"));
        assert!(PgStore::REDEEM_SQL.contains("expires_at > NOW()"));
        assert!(PgStore::REDEEM_SQL.contains("RETURNING id, user_id, code_hash"));
    }

    #[test]
    fn test_derived_columns() {
        let (level, allowed) = derived(&DeviceCapabilities::new(true, true, false));
        assert_eq!(level, "premium");
        assert!(allowed);

        let (level, allowed) = derived(&DeviceCapabilities::new(true, false, true));
        assert_eq!(level, "basic");
        assert!(!allowed);
    }

    #[test]
    fn test_score_columns_cast_to_float() {
        assert!(trust_score_columns!().contains("final_score::float8 AS final_score"));
        assert!(auth_log_columns!().contains("trust_score_at_time::float8"));
    }
}
