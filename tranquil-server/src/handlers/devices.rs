//! Device handlers
//!
//! Registration, capability reporting and trust management for a user's
//! devices. Capability writes re-derive the security level in the store;
//! whenever that switches biometrics off, the device's tokens are revoked
//! here as well.

use axum::{extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};
use tranquil_core::{can_use_biometrics, DeviceCapabilities, TrustScores};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::db::{DeviceProfile, DeviceResponse, DeviceTrustScore, UserDevice};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::validation::{client_ip, normalize_name, validate_fingerprint};

const MAX_METADATA_LEN: usize = 50;

/// Request for registering (or re-registering) a device
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterDeviceRequest {
    /// Stable client-generated device identifier
    #[schema(example = "a1b2c3d4e5f6")]
    pub fingerprint: String,
    #[serde(default)]
    #[schema(example = "Jane's iPhone")]
    pub name: Option<String>,
    #[serde(default)]
    #[schema(example = "ios")]
    pub platform: Option<String>,
    #[serde(default)]
    #[schema(example = "17.4")]
    pub os_version: Option<String>,
    #[serde(default)]
    #[schema(example = "2.3.0")]
    pub app_version: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub capabilities: DeviceCapabilities,
}

/// Request for replacing a device's capability flags
#[derive(Debug, Deserialize, ToSchema)]
pub struct CapabilitiesRequest {
    #[schema(value_type = Object)]
    pub capabilities: DeviceCapabilities,
}

/// Request for marking a device trusted or untrusted
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetTrustRequest {
    pub trusted: bool,
}

/// Request for switching biometric login on or off
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetBiometricsRequest {
    pub enabled: bool,
}

/// Externally computed trust scores, each between 0 and 100
#[derive(Debug, Deserialize, ToSchema)]
pub struct TrustScoreRequest {
    #[schema(example = 70.0)]
    pub base_score: f64,
    #[schema(example = 65.0)]
    pub behavior_score: f64,
    #[schema(example = 80.0)]
    pub location_score: f64,
    #[schema(example = 75.0)]
    pub time_score: f64,
    #[schema(example = 72.5)]
    pub final_score: f64,
}

impl From<TrustScoreRequest> for TrustScores {
    fn from(request: TrustScoreRequest) -> Self {
        TrustScores {
            base_score: request.base_score,
            behavior_score: request.behavior_score,
            location_score: request.location_score,
            time_score: request.time_score,
            final_score: request.final_score,
        }
    }
}

/// Response for device deletion
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteDeviceResponse {
    pub deleted: bool,
}

/// Load a device that belongs to the user. Other users' devices are
/// reported as missing.
pub(crate) async fn owned_device(
    state: &AppState,
    user_id: Uuid,
    device_id: Uuid,
) -> Result<UserDevice, ApiError> {
    state
        .store
        .find_device(device_id)
        .await?
        .filter(|device| device.is_owned_by(user_id))
        .ok_or_else(|| ApiError::not_found("Device not found"))
}

/// Revoke the device's tokens if biometrics were on before a write and off after.
async fn revoke_if_disabled(
    state: &AppState,
    before: &UserDevice,
    after: &UserDevice,
) -> Result<(), ApiError> {
    if before.biometric_enabled && !after.biometric_enabled {
        let revoked = state.store.deactivate_device_tokens(after.id).await?;
        tracing::info!(
            device_id = %after.id,
            revoked,
            security_level = %after.security_level,
            "Biometrics disabled, tokens revoked"
        );
    }
    Ok(())
}

fn metadata(value: Option<String>, field: &str) -> Result<Option<String>, ApiError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > MAX_METADATA_LEN {
        return Err(ApiError::bad_request(format!(
            "{field} must be at most {MAX_METADATA_LEN} characters"
        )));
    }
    Ok(Some(value))
}

impl RegisterDeviceRequest {
    fn into_profile(self) -> Result<(String, DeviceProfile), ApiError> {
        let fingerprint = self.fingerprint.trim().to_string();
        validate_fingerprint(&fingerprint)?;

        let profile = DeviceProfile {
            name: normalize_name(self.name.as_deref())?,
            platform: metadata(self.platform, "platform")?,
            os_version: metadata(self.os_version, "os_version")?,
            app_version: metadata(self.app_version, "app_version")?,
            capabilities: self.capabilities,
        };
        Ok((fingerprint, profile))
    }
}

/// Register a device
///
/// Creates the device with a default trust score (201). Registering a
/// fingerprint the caller already owns refreshes that device instead (200).
/// A fingerprint owned by another account is a conflict.
#[utoipa::path(
    post,
    path = "/api/v1/devices",
    tag = "Devices",
    request_body = RegisterDeviceRequest,
    responses(
        (status = 201, description = "Device registered", body = DeviceResponse),
        (status = 200, description = "Existing device refreshed", body = DeviceResponse),
        (status = 400, description = "Invalid fingerprint or metadata"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Fingerprint registered to another account")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn register_device_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    headers: HeaderMap,
    ApiJson(request): ApiJson<RegisterDeviceRequest>,
) -> Result<ApiResponse<DeviceResponse>, ApiError> {
    let (fingerprint, profile) = request.into_profile()?;
    let ip = client_ip(&headers);

    match state.store.find_device_by_fingerprint(&fingerprint).await? {
        Some(existing) if existing.is_owned_by(auth.id()) => {
            let device = state
                .store
                .refresh_device(existing.id, &profile, ip.as_deref())
                .await?
                .ok_or_else(|| ApiError::not_found("Device not found"))?;
            revoke_if_disabled(&state, &existing, &device).await?;

            tracing::info!(device_id = %device.id, "Device refreshed");
            Ok(ApiResponse::ok(DeviceResponse::from(device)).with_message("Device updated"))
        }
        Some(_) => Err(ApiError::conflict(
            "Device fingerprint is already registered",
        )),
        None => {
            let device = state
                .store
                .register_device(auth.id(), &fingerprint, &profile, ip.as_deref())
                .await?;

            tracing::info!(
                user_id = %auth.id(),
                device_id = %device.id,
                security_level = %device.security_level,
                "Device registered"
            );
            Ok(ApiResponse::created(DeviceResponse::from(device))
                .with_message("Device registered"))
        }
    }
}

/// List the current user's devices
#[utoipa::path(
    get,
    path = "/api/v1/devices",
    tag = "Devices",
    responses(
        (status = 200, description = "Devices, most recently seen first", body = Vec<DeviceResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_devices_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<ApiResponse<Vec<DeviceResponse>>, ApiError> {
    let devices = state.store.list_devices(auth.id()).await?;
    Ok(ApiResponse::ok(
        devices.into_iter().map(DeviceResponse::from).collect(),
    ))
}

/// Get a device
#[utoipa::path(
    get,
    path = "/api/v1/devices/{device_id}",
    tag = "Devices",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    responses(
        (status = 200, description = "Device", body = DeviceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_device_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(device_id): ApiPath<Uuid>,
) -> Result<ApiResponse<DeviceResponse>, ApiError> {
    let device = owned_device(&state, auth.id(), device_id).await?;
    Ok(ApiResponse::ok(DeviceResponse::from(device)))
}

/// Delete a device
///
/// Removes the device together with its trust score and biometric tokens.
/// Audit log entries keep their rows with the device reference cleared.
#[utoipa::path(
    delete,
    path = "/api/v1/devices/{device_id}",
    tag = "Devices",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    responses(
        (status = 200, description = "Device deleted", body = DeleteDeviceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_device_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(device_id): ApiPath<Uuid>,
) -> Result<ApiResponse<DeleteDeviceResponse>, ApiError> {
    let device = owned_device(&state, auth.id(), device_id).await?;
    let deleted = state.store.delete_device(device.id).await?;

    tracing::info!(device_id = %device.id, deleted, "Device deleted");
    Ok(ApiResponse::ok(DeleteDeviceResponse { deleted }).with_message("Device deleted"))
}

/// Replace a device's capabilities
///
/// The security level is recalculated. If the new level no longer permits
/// biometrics, biometric login is switched off and all tokens are revoked.
#[utoipa::path(
    put,
    path = "/api/v1/devices/{device_id}/capabilities",
    tag = "Devices",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    request_body = CapabilitiesRequest,
    responses(
        (status = 200, description = "Capabilities updated", body = DeviceResponse),
        (status = 400, description = "Invalid capabilities"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_capabilities_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(device_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CapabilitiesRequest>,
) -> Result<ApiResponse<DeviceResponse>, ApiError> {
    let before = owned_device(&state, auth.id(), device_id).await?;
    let device = state
        .store
        .update_capabilities(before.id, &request.capabilities)
        .await?
        .ok_or_else(|| ApiError::not_found("Device not found"))?;
    revoke_if_disabled(&state, &before, &device).await?;

    if before.security_level != device.security_level {
        tracing::info!(
            device_id = %device.id,
            from = %before.security_level,
            to = %device.security_level,
            "Device security level changed"
        );
    }

    Ok(ApiResponse::ok(DeviceResponse::from(device)).with_message("Capabilities updated"))
}

/// Device heartbeat
///
/// Marks the device as seen now from the caller's address.
#[utoipa::path(
    post,
    path = "/api/v1/devices/{device_id}/heartbeat",
    tag = "Devices",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    responses(
        (status = 200, description = "Device seen", body = DeviceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn heartbeat_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    headers: HeaderMap,
    ApiPath(device_id): ApiPath<Uuid>,
) -> Result<ApiResponse<DeviceResponse>, ApiError> {
    let device = owned_device(&state, auth.id(), device_id).await?;
    let ip = client_ip(&headers);
    let device = state
        .store
        .touch_device(device.id, ip.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Device not found"))?;

    Ok(ApiResponse::ok(DeviceResponse::from(device)))
}

/// Mark a device trusted or untrusted
#[utoipa::path(
    put,
    path = "/api/v1/devices/{device_id}/trust",
    tag = "Devices",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    request_body = SetTrustRequest,
    responses(
        (status = 200, description = "Trust flag updated", body = DeviceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_trust_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(device_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetTrustRequest>,
) -> Result<ApiResponse<DeviceResponse>, ApiError> {
    let device = owned_device(&state, auth.id(), device_id).await?;
    let device = state
        .store
        .set_device_trusted(device.id, request.trusted)
        .await?
        .ok_or_else(|| ApiError::not_found("Device not found"))?;

    tracing::info!(device_id = %device.id, trusted = request.trusted, "Device trust updated");
    Ok(ApiResponse::ok(DeviceResponse::from(device)))
}

/// Enable or disable biometric login on a device
///
/// Enabling requires a biometric sensor and a security level that permits
/// biometrics. Disabling revokes every biometric token of the device.
#[utoipa::path(
    put,
    path = "/api/v1/devices/{device_id}/biometrics",
    tag = "Devices",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    request_body = SetBiometricsRequest,
    responses(
        (status = 200, description = "Biometric flag updated", body = DeviceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Device cannot use biometrics"),
        (status = 404, description = "Device not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_biometrics_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(device_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetBiometricsRequest>,
) -> Result<ApiResponse<DeviceResponse>, ApiError> {
    let before = owned_device(&state, auth.id(), device_id).await?;

    if request.enabled
        && !can_use_biometrics(&before.capabilities, true, before.security_level)
    {
        return Err(ApiError::forbidden(format!(
            "Biometrics are not allowed on a {} device",
            before.security_level
        )));
    }

    let device = state
        .store
        .set_biometric_enabled(before.id, request.enabled)
        .await?
        .ok_or_else(|| ApiError::not_found("Device not found"))?;
    revoke_if_disabled(&state, &before, &device).await?;

    let message = if device.biometric_enabled {
        "Biometric login enabled"
    } else {
        "Biometric login disabled"
    };
    Ok(ApiResponse::ok(DeviceResponse::from(device)).with_message(message))
}

/// Get a device's trust scores
#[utoipa::path(
    get,
    path = "/api/v1/devices/{device_id}/trust-score",
    tag = "Devices",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    responses(
        (status = 200, description = "Trust scores", body = DeviceTrustScore),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_trust_score_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(device_id): ApiPath<Uuid>,
) -> Result<ApiResponse<DeviceTrustScore>, ApiError> {
    let device = owned_device(&state, auth.id(), device_id).await?;
    let score = state
        .store
        .get_trust_score(device.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Trust score not found"))?;

    Ok(ApiResponse::ok(score))
}

/// Replace a device's trust scores
///
/// Scores are computed elsewhere; this endpoint only range-checks and stores them.
#[utoipa::path(
    put,
    path = "/api/v1/devices/{device_id}/trust-score",
    tag = "Devices",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    request_body = TrustScoreRequest,
    responses(
        (status = 200, description = "Trust scores updated", body = DeviceTrustScore),
        (status = 400, description = "Score outside 0-100"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_trust_score_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(device_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<TrustScoreRequest>,
) -> Result<ApiResponse<DeviceTrustScore>, ApiError> {
    let scores = TrustScores::from(request).normalized()?;

    let device = owned_device(&state, auth.id(), device_id).await?;
    let score = state
        .store
        .update_trust_score(device.id, &scores)
        .await?
        .ok_or_else(|| ApiError::not_found("Trust score not found"))?;

    tracing::info!(
        device_id = %device.id,
        final_score = score.final_score,
        high_trust = score.is_high_trust(),
        "Trust score updated"
    );
    Ok(ApiResponse::ok(score))
}
