//! User device entity
//!
//! A device carries its capability flags as JSON and a security level that is
//! always derived from them. Every write path goes through
//! [`UserDevice::apply_capabilities`] (memory) or the equivalent SQL (postgres).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use tranquil_core::{calculate_security_level, can_use_biometrics, DeviceCapabilities, SecurityLevel};
use utoipa::ToSchema;
use uuid::Uuid;

/// Device entity from database
#[derive(Debug, Clone, FromRow)]
pub struct UserDevice {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fingerprint: String,
    pub name: Option<String>,
    pub platform: Option<String>,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
    pub capabilities: Json<DeviceCapabilities>,
    #[sqlx(try_from = "String")]
    pub security_level: SecurityLevel,
    pub is_trusted: bool,
    pub biometric_enabled: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub last_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDevice {
    /// Level implied by the stored capabilities.
    pub fn calculate_security_level(&self) -> SecurityLevel {
        calculate_security_level(&self.capabilities)
    }

    /// Recompute `security_level` from the capabilities. Returns true if it changed.
    pub fn update_security_level(&mut self) -> bool {
        let level = self.calculate_security_level();
        let changed = level != self.security_level;
        self.security_level = level;
        changed
    }

    pub fn can_use_biometrics(&self) -> bool {
        can_use_biometrics(&self.capabilities, self.biometric_enabled, self.security_level)
    }

    /// Replace capabilities, re-derive the level and drop `biometric_enabled`
    /// when the new state no longer permits biometrics.
    ///
    /// Returns true if biometrics were switched off as a result.
    pub fn apply_capabilities(&mut self, capabilities: DeviceCapabilities) -> bool {
        self.capabilities = Json(capabilities);
        self.update_security_level();

        let was_enabled = self.biometric_enabled;
        self.biometric_enabled = was_enabled && self.can_use_biometrics();
        was_enabled && !self.biometric_enabled
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Client-reported device metadata written on registration and refresh.
#[derive(Debug, Clone, Default)]
pub struct DeviceProfile {
    pub name: Option<String>,
    pub platform: Option<String>,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
    pub capabilities: DeviceCapabilities,
}

/// Device response DTO
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeviceResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(example = "a1b2c3d4e5f6")]
    pub fingerprint: String,
    #[schema(example = "Jane's iPhone")]
    pub name: Option<String>,
    #[schema(example = "ios")]
    pub platform: Option<String>,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
    /// Capability flags as reported by the device
    #[schema(value_type = Object)]
    pub capabilities: DeviceCapabilities,
    /// premium | protected | basic | insecure
    #[schema(value_type = String, example = "premium")]
    pub security_level: SecurityLevel,
    pub is_trusted: bool,
    pub biometric_enabled: bool,
    /// Whether biometric login is currently possible on this device
    pub can_use_biometrics: bool,
    #[schema(value_type = Option<String>)]
    pub last_seen_at: Option<DateTime<Utc>>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<UserDevice> for DeviceResponse {
    fn from(device: UserDevice) -> Self {
        let can_use_biometrics = device.can_use_biometrics();
        Self {
            id: device.id,
            fingerprint: device.fingerprint,
            name: device.name,
            platform: device.platform,
            os_version: device.os_version,
            app_version: device.app_version,
            capabilities: device.capabilities.0,
            security_level: device.security_level,
            is_trusted: device.is_trusted,
            biometric_enabled: device.biometric_enabled,
            can_use_biometrics,
            last_seen_at: device.last_seen_at,
            created_at: device.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_device(capabilities: DeviceCapabilities, biometric_enabled: bool) -> UserDevice {
    let now = Utc::now();
    UserDevice {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        fingerprint: "fp-test".to_string(),
        name: None,
        platform: Some("ios".to_string()),
        os_version: None,
        app_version: None,
        security_level: calculate_security_level(&capabilities),
        capabilities: Json(capabilities),
        is_trusted: false,
        biometric_enabled,
        last_seen_at: None,
        last_ip: None,
        created_at: now,
        updated_at: now,
    }
}
