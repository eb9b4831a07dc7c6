//! Authentication audit log entity (append-only)

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use tranquil_core::{AuthMethod, AuthOutcome, FailureReason};
use utoipa::ToSchema;
use uuid::Uuid;

/// One authentication attempt
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AuthLog {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: Uuid,
    #[schema(value_type = Option<String>)]
    pub device_id: Option<Uuid>,
    /// password | biometric | backup_code
    #[sqlx(try_from = "String")]
    #[schema(value_type = String, example = "biometric")]
    pub auth_method: AuthMethod,
    /// success | failure
    #[sqlx(try_from = "String")]
    #[schema(value_type = String, example = "success")]
    pub result: AuthOutcome,
    #[schema(example = "token_mismatch")]
    pub failure_reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Final trust score of the device when the attempt was made
    pub trust_score_at_time: Option<f64>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// Entry to append
#[derive(Debug, Clone)]
pub struct NewAuthLog {
    pub user_id: Uuid,
    pub device_id: Option<Uuid>,
    pub auth_method: AuthMethod,
    pub result: AuthOutcome,
    pub failure_reason: Option<FailureReason>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub trust_score_at_time: Option<f64>,
}

impl NewAuthLog {
    pub fn success(user_id: Uuid, auth_method: AuthMethod) -> Self {
        Self {
            user_id,
            device_id: None,
            auth_method,
            result: AuthOutcome::Success,
            failure_reason: None,
            ip_address: None,
            user_agent: None,
            trust_score_at_time: None,
        }
    }

    pub fn failure(user_id: Uuid, auth_method: AuthMethod, reason: FailureReason) -> Self {
        Self {
            result: AuthOutcome::Failure,
            failure_reason: Some(reason),
            ..Self::success(user_id, auth_method)
        }
    }

    pub fn with_device(mut self, device_id: Uuid, trust_score: Option<f64>) -> Self {
        self.device_id = Some(device_id);
        self.trust_score_at_time = trust_score;
        self
    }

    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    /// Materialise the row (memory backend).
    pub(crate) fn into_log(self, id: Uuid, created_at: DateTime<Utc>) -> AuthLog {
        AuthLog {
            id,
            user_id: self.user_id,
            device_id: self.device_id,
            auth_method: self.auth_method,
            result: self.result,
            failure_reason: self.failure_reason.map(|r| r.as_str().to_string()),
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            trust_score_at_time: self.trust_score_at_time,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_entry_carries_reason() {
        let user_id = Uuid::new_v4();
        let device_id = Uuid::new_v4();
        let entry = NewAuthLog::failure(user_id, AuthMethod::Biometric, FailureReason::TokenMismatch)
            .with_device(device_id, Some(50.0))
            .with_client(Some("203.0.113.7".into()), Some("TranquilApp/1.0".into()));

        let log = entry.into_log(Uuid::new_v4(), Utc::now());
        assert_eq!(log.result, AuthOutcome::Failure);
        assert_eq!(log.failure_reason.as_deref(), Some("token_mismatch"));
        assert_eq!(log.device_id, Some(device_id));
        assert_eq!(log.trust_score_at_time, Some(50.0));

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["auth_method"], "biometric");
        assert_eq!(json["result"], "failure");
    }

    #[test]
    fn test_success_entry_has_no_reason() {
        let log = NewAuthLog::success(Uuid::new_v4(), AuthMethod::Password)
            .into_log(Uuid::new_v4(), Utc::now());
        assert_eq!(log.result, AuthOutcome::Success);
        assert!(log.failure_reason.is_none());
        assert!(log.device_id.is_none());
    }
}
