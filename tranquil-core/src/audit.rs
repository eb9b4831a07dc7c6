//! Vocabulary for the authentication audit trail.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How the user tried to authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Password,
    Biometric,
    BackupCode,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Password => "password",
            AuthMethod::Biometric => "biometric",
            AuthMethod::BackupCode => "backup_code",
        }
    }
}

/// Outcome of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOutcome {
    Success,
    Failure,
}

impl AuthOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthOutcome::Success => "success",
            AuthOutcome::Failure => "failure",
        }
    }
}

/// Why an attempt failed. Stored as text in `auth_logs.failure_reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    InvalidPassword,
    UnknownDevice,
    BiometricsUnavailable,
    TokenNotFound,
    TokenExpired,
    TokenMismatch,
    MalformedCode,
    CodeNotFound,
    CodeAlreadyUsed,
    CodeExpired,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidPassword => "invalid_password",
            FailureReason::UnknownDevice => "unknown_device",
            FailureReason::BiometricsUnavailable => "biometrics_unavailable",
            FailureReason::TokenNotFound => "token_not_found",
            FailureReason::TokenExpired => "token_expired",
            FailureReason::TokenMismatch => "token_mismatch",
            FailureReason::MalformedCode => "malformed_code",
            FailureReason::CodeNotFound => "code_not_found",
            FailureReason::CodeAlreadyUsed => "code_already_used",
            FailureReason::CodeExpired => "code_expired",
        }
    }
}

macro_rules! text_enum {
    ($ty:ty, $kind:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| CoreError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

text_enum!(
    AuthMethod,
    "auth method",
    [AuthMethod::Password, AuthMethod::Biometric, AuthMethod::BackupCode]
);
text_enum!(
    AuthOutcome,
    "auth result",
    [AuthOutcome::Success, AuthOutcome::Failure]
);

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_method_round_trip_text() {
        for method in [AuthMethod::Password, AuthMethod::Biometric, AuthMethod::BackupCode] {
            assert_eq!(method.as_str().parse::<AuthMethod>().unwrap(), method);
        }
        assert!("sms".parse::<AuthMethod>().is_err());
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AuthOutcome::Failure).unwrap(),
            "\"failure\""
        );
        assert_eq!(
            AuthOutcome::try_from("success".to_string()).unwrap(),
            AuthOutcome::Success
        );
    }

    #[test]
    fn test_failure_reason_text() {
        assert_eq!(FailureReason::CodeAlreadyUsed.to_string(), "code_already_used");
        assert_eq!(FailureReason::UnknownDevice.to_string(), "unknown_device");
    }
}
