//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.
//! Every `/api/v1` handler answers with the `{ success, data, message }`
//! envelope and reports failures through [`crate::error::ApiError`].

pub mod auth;
pub mod auth_logs;
pub mod backup_codes;
pub mod biometric;
pub mod devices;
pub mod health;
pub mod user;

pub use crate::state::AppState;
pub use auth::{
    backup_code_login_handler, biometric_login_handler, login_handler, register_handler,
    BackupCodeLoginRequest, BiometricLoginRequest, LoginRequest, RegisterRequest, SessionResponse,
};
pub use auth_logs::{list_auth_logs_handler, AuthLogQuery};
pub use backup_codes::{
    generate_backup_codes_handler, list_backup_codes_handler, BackupCodeListResponse,
    GeneratedBackupCodesResponse,
};
pub use biometric::{
    create_biometric_token_handler, list_biometric_tokens_handler, revoke_biometric_token_handler,
    rotate_biometric_token_handler, CreateBiometricTokenRequest, IssuedBiometricTokenResponse,
    RevokeTokenResponse,
};
pub use devices::{
    delete_device_handler, get_device_handler, get_trust_score_handler, heartbeat_handler,
    list_devices_handler, register_device_handler, set_biometrics_handler, set_trust_handler,
    update_capabilities_handler, update_trust_score_handler, CapabilitiesRequest,
    DeleteDeviceResponse, RegisterDeviceRequest, SetBiometricsRequest, SetTrustRequest,
    TrustScoreRequest,
};
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use user::{
    delete_user_handler, get_current_user_handler, update_current_user_handler,
    DeleteUserResponse, UpdateProfileRequest,
};
