//! In-memory storage backend
//!
//! Development and test fallback used when `DATABASE_URL` is not set.
//! Row updates happen under a single `DashMap` shard lock, and uniqueness of
//! emails, fingerprints and active tokens is kept through index maps using
//! the entry API. Never hold a reference into one map while writing to the
//! same map.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::types::Json;
use tranquil_core::{calculate_security_level, BiometricType, DeviceCapabilities, TrustScores};
use uuid::Uuid;

use super::user::deleted_email;
use super::{
    conflict_message, AuthLog, AuthLogStore, BackupCode, BackupCodeRedemption, BackupCodeStore,
    BiometricToken, BiometricTokenStore, DeviceProfile, DeviceStore, DeviceTrustScore, NewAuthLog,
    NewBackupCode, NewBiometricToken, NewUser, Store, StoreError, UpdateUser, User, UserDevice,
    UserStore,
};

/// Thread-safe in-memory storage for all entities
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    /// normalized email -> user id (live users only)
    emails: DashMap<String, Uuid>,
    devices: DashMap<Uuid, UserDevice>,
    /// fingerprint -> device id
    fingerprints: DashMap<String, Uuid>,
    trust_scores: DashMap<Uuid, DeviceTrustScore>,
    tokens: DashMap<Uuid, BiometricToken>,
    /// (device id, type) -> id of the active token
    active_tokens: DashMap<(Uuid, BiometricType), Uuid>,
    /// user id -> log entries in insertion order
    auth_logs: DashMap<Uuid, Vec<AuthLog>>,
    /// user id -> backup codes
    backup_codes: DashMap<Uuid, Vec<BackupCode>>,
}

impl MemoryStore {
    /// Create a new storage instance
    pub fn new() -> Self {
        Self::default()
    }

    fn conflict(constraint: &str) -> StoreError {
        StoreError::Conflict(conflict_message(Some(constraint)).to_string())
    }

    fn update_device<F>(&self, id: Uuid, apply: F) -> Option<UserDevice>
    where
        F: FnOnce(&mut UserDevice, DateTime<Utc>),
    {
        let now = Utc::now();
        let mut device = self.devices.get_mut(&id)?;
        apply(device.value_mut(), now);
        device.updated_at = now;
        Some(device.value().clone())
    }

    fn update_token<F>(&self, id: Uuid, apply: F) -> Option<BiometricToken>
    where
        F: FnOnce(&mut BiometricToken, DateTime<Utc>),
    {
        let now = Utc::now();
        let mut token = self.tokens.get_mut(&id)?;
        apply(token.value_mut(), now);
        token.updated_at = now;
        Some(token.value().clone())
    }

    fn deactivate_token(&self, id: Uuid) -> bool {
        let key = {
            let Some(mut token) = self.tokens.get_mut(&id) else {
                return false;
            };
            if !token.is_active {
                return false;
            }
            token.is_active = false;
            token.updated_at = Utc::now();
            (token.device_id, token.biometric_type)
        };
        self.active_tokens.remove_if(&key, |_, active| *active == id);
        true
    }

    fn deactivate_tokens_where<P>(&self, predicate: P) -> u64
    where
        P: Fn(&BiometricToken) -> bool,
    {
        let ids: Vec<Uuid> = self
            .tokens
            .iter()
            .filter(|t| t.is_active && predicate(t.value()))
            .map(|t| t.id)
            .collect();

        ids.into_iter().filter(|id| self.deactivate_token(*id)).count() as u64
    }

    /// Drop a device with its trust score and tokens. Audit entries stay but
    /// lose their device reference.
    fn remove_device(&self, id: Uuid) -> bool {
        let Some((_, device)) = self.devices.remove(&id) else {
            return false;
        };

        self.fingerprints
            .remove_if(&device.fingerprint, |_, owner| *owner == id);
        self.trust_scores.remove(&id);
        self.active_tokens.retain(|(device_id, _), _| *device_id != id);
        self.tokens.retain(|_, token| token.device_id != id);
        if let Some(mut logs) = self.auth_logs.get_mut(&device.user_id) {
            logs.iter_mut()
                .filter(|log| log.device_id == Some(id))
                .for_each(|log| log.device_id = None);
        }
        true
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, input: NewUser) -> Result<User, StoreError> {
        match self.emails.entry(input.email.clone()) {
            Entry::Occupied(_) => Err(Self::conflict("users_email_key")),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    email: input.email,
                    password_hash: input.password_hash,
                    name: input.name,
                    email_verified: false,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .get(&id)
            .and_then(|user| (!user.is_deleted()).then(|| user.value().clone())))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let id = self.emails.get(email).map(|entry| *entry.value());
        match id {
            Some(id) => self.find_user_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<User>, StoreError> {
        let Some(mut user) = self.users.get_mut(&id) else {
            return Ok(None);
        };
        if user.is_deleted() {
            return Ok(None);
        }
        if let Some(name) = input.name {
            user.name = Some(name);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.value().clone()))
    }

    async fn soft_delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let previous_email = {
            let Some(mut user) = self.users.get_mut(&id) else {
                return Ok(false);
            };
            if user.is_deleted() {
                return Ok(false);
            }
            let now = Utc::now();
            user.name = None;
            user.deleted_at = Some(now);
            user.updated_at = now;
            std::mem::replace(&mut user.email, deleted_email(id))
        };

        self.emails.remove(&previous_email);
        self.deactivate_tokens_where(|t| t.user_id == id);

        let devices: Vec<Uuid> = self
            .devices
            .iter()
            .filter(|d| d.user_id == id)
            .map(|d| d.id)
            .collect();
        for device_id in devices {
            self.remove_device(device_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn register_device(
        &self,
        user_id: Uuid,
        fingerprint: &str,
        profile: &DeviceProfile,
        ip_address: Option<&str>,
    ) -> Result<UserDevice, StoreError> {
        match self.fingerprints.entry(fingerprint.to_string()) {
            Entry::Occupied(_) => Err(Self::conflict("user_devices_fingerprint_key")),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let capabilities = profile.capabilities.clone();
                let device = UserDevice {
                    id: Uuid::new_v4(),
                    user_id,
                    fingerprint: fingerprint.to_string(),
                    name: profile.name.clone(),
                    platform: profile.platform.clone(),
                    os_version: profile.os_version.clone(),
                    app_version: profile.app_version.clone(),
                    security_level: calculate_security_level(&capabilities),
                    capabilities: Json(capabilities),
                    is_trusted: false,
                    biometric_enabled: false,
                    last_seen_at: Some(now),
                    last_ip: ip_address.map(str::to_string),
                    created_at: now,
                    updated_at: now,
                };
                self.trust_scores
                    .insert(device.id, DeviceTrustScore::initial(device.id, now));
                self.devices.insert(device.id, device.clone());
                slot.insert(device.id);
                Ok(device)
            }
        }
    }

    async fn find_device(&self, id: Uuid) -> Result<Option<UserDevice>, StoreError> {
        Ok(self.devices.get(&id).map(|device| device.value().clone()))
    }

    async fn find_device_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<UserDevice>, StoreError> {
        let id = self.fingerprints.get(fingerprint).map(|entry| *entry.value());
        match id {
            Some(id) => self.find_device(id).await,
            None => Ok(None),
        }
    }

    async fn list_devices(&self, user_id: Uuid) -> Result<Vec<UserDevice>, StoreError> {
        let mut devices: Vec<UserDevice> = self
            .devices
            .iter()
            .filter(|d| d.user_id == user_id)
            .map(|d| d.value().clone())
            .collect();
        devices.sort_by(|a, b| {
            b.last_seen_at
                .cmp(&a.last_seen_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(devices)
    }

    async fn refresh_device(
        &self,
        id: Uuid,
        profile: &DeviceProfile,
        ip_address: Option<&str>,
    ) -> Result<Option<UserDevice>, StoreError> {
        Ok(self.update_device(id, |device, now| {
            if profile.name.is_some() {
                device.name = profile.name.clone();
            }
            if profile.platform.is_some() {
                device.platform = profile.platform.clone();
            }
            if profile.os_version.is_some() {
                device.os_version = profile.os_version.clone();
            }
            if profile.app_version.is_some() {
                device.app_version = profile.app_version.clone();
            }
            device.apply_capabilities(profile.capabilities.clone());
            device.last_seen_at = Some(now);
            if let Some(ip) = ip_address {
                device.last_ip = Some(ip.to_string());
            }
        }))
    }

    async fn update_capabilities(
        &self,
        id: Uuid,
        capabilities: &DeviceCapabilities,
    ) -> Result<Option<UserDevice>, StoreError> {
        Ok(self.update_device(id, |device, _| {
            device.apply_capabilities(capabilities.clone());
        }))
    }

    async fn touch_device(
        &self,
        id: Uuid,
        ip_address: Option<&str>,
    ) -> Result<Option<UserDevice>, StoreError> {
        Ok(self.update_device(id, |device, now| {
            device.last_seen_at = Some(now);
            if let Some(ip) = ip_address {
                device.last_ip = Some(ip.to_string());
            }
        }))
    }

    async fn set_device_trusted(
        &self,
        id: Uuid,
        trusted: bool,
    ) -> Result<Option<UserDevice>, StoreError> {
        Ok(self.update_device(id, |device, _| device.is_trusted = trusted))
    }

    async fn set_biometric_enabled(
        &self,
        id: Uuid,
        enabled: bool,
    ) -> Result<Option<UserDevice>, StoreError> {
        Ok(self.update_device(id, |device, _| device.biometric_enabled = enabled))
    }

    async fn delete_device(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.remove_device(id))
    }

    async fn get_trust_score(
        &self,
        device_id: Uuid,
    ) -> Result<Option<DeviceTrustScore>, StoreError> {
        Ok(self.trust_scores.get(&device_id).map(|score| score.value().clone()))
    }

    async fn update_trust_score(
        &self,
        device_id: Uuid,
        scores: &TrustScores,
    ) -> Result<Option<DeviceTrustScore>, StoreError> {
        let Some(mut row) = self.trust_scores.get_mut(&device_id) else {
            return Ok(None);
        };
        *row = DeviceTrustScore::from_scores(device_id, scores, Utc::now());
        Ok(Some(row.value().clone()))
    }
}

#[async_trait]
impl BiometricTokenStore for MemoryStore {
    async fn create_biometric_token(
        &self,
        input: NewBiometricToken,
    ) -> Result<BiometricToken, StoreError> {
        match self.active_tokens.entry((input.device_id, input.biometric_type)) {
            Entry::Occupied(_) => Err(Self::conflict("biometric_tokens_active_idx")),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let token = BiometricToken {
                    id: Uuid::new_v4(),
                    user_id: input.user_id,
                    device_id: input.device_id,
                    token_hash: input.token_hash,
                    biometric_type: input.biometric_type,
                    challenge_attempts: 0,
                    success_count: 0,
                    last_used_at: None,
                    expires_at: Some(input.expires_at),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                self.tokens.insert(token.id, token.clone());
                slot.insert(token.id);
                Ok(token)
            }
        }
    }

    async fn find_biometric_token(&self, id: Uuid) -> Result<Option<BiometricToken>, StoreError> {
        Ok(self.tokens.get(&id).map(|token| token.value().clone()))
    }

    async fn find_active_biometric_token(
        &self,
        device_id: Uuid,
        biometric_type: BiometricType,
    ) -> Result<Option<BiometricToken>, StoreError> {
        let id = self
            .active_tokens
            .get(&(device_id, biometric_type))
            .map(|entry| *entry.value());
        match id {
            Some(id) => self.find_biometric_token(id).await,
            None => Ok(None),
        }
    }

    async fn list_biometric_tokens(
        &self,
        device_id: Uuid,
    ) -> Result<Vec<BiometricToken>, StoreError> {
        let mut tokens: Vec<BiometricToken> = self
            .tokens
            .iter()
            .filter(|t| t.device_id == device_id)
            .map(|t| t.value().clone())
            .collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tokens)
    }

    async fn rotate_biometric_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<BiometricToken>, StoreError> {
        let now = Utc::now();
        let Some(mut token) = self.tokens.get_mut(&id) else {
            return Ok(None);
        };
        if !token.is_active {
            return Ok(None);
        }
        token.token_hash = token_hash.to_string();
        token.challenge_attempts = 0;
        token.expires_at = Some(expires_at);
        token.updated_at = now;
        Ok(Some(token.value().clone()))
    }

    async fn record_token_attempt(&self, id: Uuid) -> Result<Option<BiometricToken>, StoreError> {
        Ok(self.update_token(id, |token, _| token.challenge_attempts += 1))
    }

    async fn record_token_usage(&self, id: Uuid) -> Result<Option<BiometricToken>, StoreError> {
        Ok(self.update_token(id, |token, now| {
            token.success_count += 1;
            token.last_used_at = Some(now);
        }))
    }

    async fn deactivate_biometric_token(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.deactivate_token(id))
    }

    async fn deactivate_device_tokens(&self, device_id: Uuid) -> Result<u64, StoreError> {
        Ok(self.deactivate_tokens_where(|t| t.device_id == device_id))
    }
}

#[async_trait]
impl AuthLogStore for MemoryStore {
    async fn append_auth_log(&self, entry: NewAuthLog) -> Result<AuthLog, StoreError> {
        let log = entry.into_log(Uuid::new_v4(), Utc::now());
        self.auth_logs
            .entry(log.user_id)
            .or_default()
            .push(log.clone());
        Ok(log)
    }

    async fn list_auth_logs(&self, user_id: Uuid, limit: i64) -> Result<Vec<AuthLog>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .auth_logs
            .get(&user_id)
            .map(|logs| logs.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl BackupCodeStore for MemoryStore {
    async fn replace_backup_codes(
        &self,
        user_id: Uuid,
        codes: Vec<NewBackupCode>,
    ) -> Result<Vec<BackupCode>, StoreError> {
        let now = Utc::now();
        let created: Vec<BackupCode> = codes
            .into_iter()
            .map(|code| BackupCode {
                id: Uuid::new_v4(),
                user_id,
                code_hash: code.code_hash,
                code_partial: code.code_partial,
                is_used: false,
                used_at: None,
                expires_at: code.expires_at,
                created_at: now,
            })
            .collect();

        let mut stored = self.backup_codes.entry(user_id).or_default();
        stored.retain(|code| code.is_used);
        stored.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_backup_codes(&self, user_id: Uuid) -> Result<Vec<BackupCode>, StoreError> {
        Ok(self
            .backup_codes
            .get(&user_id)
            .map(|codes| codes.value().clone())
            .unwrap_or_default())
    }

    async fn redeem_backup_code(
        &self,
        user_id: Uuid,
        code_hash: &str,
    ) -> Result<BackupCodeRedemption, StoreError> {
        let now = Utc::now();
        let Some(mut codes) = self.backup_codes.get_mut(&user_id) else {
            return Ok(BackupCodeRedemption::NotFound);
        };
        let Some(code) = codes.iter_mut().find(|c| c.code_hash == code_hash) else {
            return Ok(BackupCodeRedemption::NotFound);
        };
        if !code.is_redeemable(now) {
            return Ok(code.rejection());
        }

        code.is_used = true;
        code.used_at = Some(now);
        Ok(BackupCodeRedemption::Redeemed(code.clone()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn is_persistent(&self) -> bool {
        false
    }

    async fn check_health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
