//! Device capabilities and the security level derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::token::BiometricType;

/// Capability flags reported by a client device at registration time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Device has a usable biometric sensor (Face ID, Touch ID, fingerprint...)
    #[serde(default)]
    pub has_biometrics: bool,
    /// Device is protected by a passcode / PIN
    #[serde(default)]
    pub has_device_passcode: bool,
    /// Device locks its screen automatically
    #[serde(default)]
    pub has_screen_lock: bool,
    /// Biometric modalities the device advertises (empty = unspecified)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub biometric_types: Vec<BiometricType>,
}

impl DeviceCapabilities {
    pub fn new(has_biometrics: bool, has_device_passcode: bool, has_screen_lock: bool) -> Self {
        Self {
            has_biometrics,
            has_device_passcode,
            has_screen_lock,
            biometric_types: Vec::new(),
        }
    }

    /// Derive the security level for these capabilities.
    pub fn security_level(&self) -> SecurityLevel {
        calculate_security_level(self)
    }

    /// Whether a biometric modality may be bound on this device.
    ///
    /// Devices that do not list their modalities accept any type.
    pub fn supports(&self, biometric_type: BiometricType) -> bool {
        self.biometric_types.is_empty() || self.biometric_types.contains(&biometric_type)
    }
}

/// Coarse security classification of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    /// Biometrics and a device passcode
    Premium,
    /// Passcode and screen lock, no biometrics
    Protected,
    /// Screen lock only
    Basic,
    /// No protection at all
    Insecure,
}

impl SecurityLevel {
    pub const ALL: [SecurityLevel; 4] = [
        SecurityLevel::Premium,
        SecurityLevel::Protected,
        SecurityLevel::Basic,
        SecurityLevel::Insecure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityLevel::Premium => "premium",
            SecurityLevel::Protected => "protected",
            SecurityLevel::Basic => "basic",
            SecurityLevel::Insecure => "insecure",
        }
    }

    /// Levels on which biometric unlock may be offered.
    pub fn allows_biometrics(&self) -> bool {
        matches!(self, SecurityLevel::Premium | SecurityLevel::Protected)
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "premium" => Ok(SecurityLevel::Premium),
            "protected" => Ok(SecurityLevel::Protected),
            "basic" => Ok(SecurityLevel::Basic),
            "insecure" => Ok(SecurityLevel::Insecure),
            other => Err(CoreError::UnknownVariant {
                kind: "security level",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for SecurityLevel {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Map capability flags to a security level.
///
/// Priority: premium (biometrics + passcode), protected (passcode + screen
/// lock), basic (screen lock), insecure otherwise.
pub fn calculate_security_level(capabilities: &DeviceCapabilities) -> SecurityLevel {
    if capabilities.has_biometrics && capabilities.has_device_passcode {
        SecurityLevel::Premium
    } else if capabilities.has_device_passcode && capabilities.has_screen_lock {
        SecurityLevel::Protected
    } else if capabilities.has_screen_lock {
        SecurityLevel::Basic
    } else {
        SecurityLevel::Insecure
    }
}

/// Whether biometric authentication may be used on a device.
pub fn can_use_biometrics(
    capabilities: &DeviceCapabilities,
    biometric_enabled: bool,
    security_level: SecurityLevel,
) -> bool {
    capabilities.has_biometrics && biometric_enabled && security_level.allows_biometrics()
}
