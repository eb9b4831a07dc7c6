//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 specification for the Tranquil API, served at
//! `/api-docs/openapi.json` with Swagger UI at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::db::{AuthLog, BackupCodeResponse, BiometricTokenResponse, DeviceResponse, DeviceTrustScore, UserResponse};
use crate::handlers::{
    BackupCodeListResponse, BackupCodeLoginRequest, BiometricLoginRequest, CapabilitiesRequest,
    CreateBiometricTokenRequest, DeleteDeviceResponse, DeleteUserResponse,
    GeneratedBackupCodesResponse, HealthResponse, IssuedBiometricTokenResponse, LoginRequest,
    ReadyResponse, RegisterDeviceRequest, RegisterRequest, RevokeTokenResponse, SessionResponse,
    SetBiometricsRequest, SetTrustRequest, TrustScoreRequest, UpdateProfileRequest,
};

/// Registers the `bearer_auth` scheme referenced by protected endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Tranquil API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tranquil API",
        version = "0.1.0",
        description = r#"
## Device trust and biometric authentication

Backend for the Tranquil wellness app:

- **Accounts** with Argon2-hashed passwords and JWT sessions
- **Devices** whose security level is derived from reported capabilities
- **Biometric tokens** bound to a device and modality, stored only as hashes
- **Backup codes** for one-time recovery logins
- **Audit trail** of every authentication attempt

Successful responses use `{ "success": true, "data": ..., "message": ... }`.
Errors use `{ "success": false, "error": CODE, "message": ... }`.
"#
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "Current user profile"),
        (name = "Devices", description = "Device registration, capabilities and trust"),
        (name = "Biometric Tokens", description = "Biometric token lifecycle"),
        (name = "Backup Codes", description = "One-time recovery codes"),
        (name = "Auth Logs", description = "Authentication audit trail"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::auth::register_handler,
        crate::handlers::auth::login_handler,
        crate::handlers::auth::biometric_login_handler,
        crate::handlers::auth::backup_code_login_handler,
        crate::handlers::user::get_current_user_handler,
        crate::handlers::user::update_current_user_handler,
        crate::handlers::user::delete_user_handler,
        crate::handlers::devices::register_device_handler,
        crate::handlers::devices::list_devices_handler,
        crate::handlers::devices::get_device_handler,
        crate::handlers::devices::delete_device_handler,
        crate::handlers::devices::update_capabilities_handler,
        crate::handlers::devices::heartbeat_handler,
        crate::handlers::devices::set_trust_handler,
        crate::handlers::devices::set_biometrics_handler,
        crate::handlers::devices::get_trust_score_handler,
        crate::handlers::devices::update_trust_score_handler,
        crate::handlers::biometric::create_biometric_token_handler,
        crate::handlers::biometric::list_biometric_tokens_handler,
        crate::handlers::biometric::rotate_biometric_token_handler,
        crate::handlers::biometric::revoke_biometric_token_handler,
        crate::handlers::backup_codes::generate_backup_codes_handler,
        crate::handlers::backup_codes::list_backup_codes_handler,
        crate::handlers::auth_logs::list_auth_logs_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            RegisterRequest,
            LoginRequest,
            BiometricLoginRequest,
            BackupCodeLoginRequest,
            SessionResponse,
            UserResponse,
            UpdateProfileRequest,
            DeleteUserResponse,
            RegisterDeviceRequest,
            CapabilitiesRequest,
            SetTrustRequest,
            SetBiometricsRequest,
            TrustScoreRequest,
            DeviceResponse,
            DeleteDeviceResponse,
            DeviceTrustScore,
            CreateBiometricTokenRequest,
            BiometricTokenResponse,
            IssuedBiometricTokenResponse,
            RevokeTokenResponse,
            GeneratedBackupCodesResponse,
            BackupCodeListResponse,
            BackupCodeResponse,
            AuthLog,
        )
    )
)]
pub struct ApiDoc;
