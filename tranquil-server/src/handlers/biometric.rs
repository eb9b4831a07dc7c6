//! Biometric token lifecycle handlers
//!
//! A token binds one biometric modality on one device. The raw value is
//! returned exactly once (on creation or rotation); only its hash is stored.

use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tranquil_core::BiometricType;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::db::{BiometricToken, BiometricTokenResponse, NewBiometricToken};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::response::ApiResponse;
use crate::state::AppState;

use super::devices::owned_device;

/// Request for binding a biometric modality on a device
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBiometricTokenRequest {
    /// face_id | touch_id | fingerprint | face | iris
    #[schema(value_type = String, example = "face_id")]
    pub biometric_type: BiometricType,
}

/// Token metadata plus the raw token, shown once
#[derive(Debug, Serialize, ToSchema)]
pub struct IssuedBiometricTokenResponse {
    pub token: BiometricTokenResponse,
    /// Raw token for the device's secure storage. It cannot be retrieved again.
    pub raw_token: String,
}

/// Response for token revocation
#[derive(Debug, Serialize, ToSchema)]
pub struct RevokeTokenResponse {
    /// False if the token was already inactive
    pub revoked: bool,
}

/// Load a token whose device belongs to the user.
async fn owned_token(
    state: &AppState,
    user_id: Uuid,
    token_id: Uuid,
) -> Result<BiometricToken, ApiError> {
    state
        .store
        .find_biometric_token(token_id)
        .await?
        .filter(|token| token.user_id == user_id)
        .ok_or_else(|| ApiError::not_found("Biometric token not found"))
}

/// Create a biometric token
///
/// The device must currently allow biometrics and support the requested
/// modality. At most one active token exists per device and modality; an
/// expired one is deactivated and replaced.
#[utoipa::path(
    post,
    path = "/api/v1/devices/{device_id}/biometric-tokens",
    tag = "Biometric Tokens",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    request_body = CreateBiometricTokenRequest,
    responses(
        (status = 201, description = "Token created", body = IssuedBiometricTokenResponse),
        (status = 400, description = "Modality not supported by the device"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Biometrics not available on this device"),
        (status = 404, description = "Device not found"),
        (status = 409, description = "An active token already exists")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_biometric_token_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(device_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateBiometricTokenRequest>,
) -> Result<ApiResponse<IssuedBiometricTokenResponse>, ApiError> {
    let device = owned_device(&state, auth.id(), device_id).await?;
    let biometric_type = request.biometric_type;

    if !device.can_use_biometrics() {
        return Err(ApiError::forbidden(
            "Biometric authentication is not available on this device",
        ));
    }
    if !device.capabilities.supports(biometric_type) {
        return Err(ApiError::bad_request(format!(
            "Device does not support {biometric_type}"
        )));
    }

    let now = Utc::now();
    if let Some(existing) = state
        .store
        .find_active_biometric_token(device.id, biometric_type)
        .await?
    {
        if existing.is_valid(now) {
            return Err(ApiError::conflict(
                "An active biometric token already exists for this device and type",
            ));
        }
        state.store.deactivate_biometric_token(existing.id).await?;
    }

    let (input, raw) = NewBiometricToken::issue(auth.id(), device.id, biometric_type, now)?;
    let token = state.store.create_biometric_token(input).await?;

    tracing::info!(
        token_id = %token.id,
        device_id = %device.id,
        biometric_type = %biometric_type,
        "Biometric token created"
    );

    Ok(ApiResponse::created(IssuedBiometricTokenResponse {
        token: BiometricTokenResponse::from(token),
        raw_token: raw.expose_secret().to_string(),
    })
    .with_message("Store the raw token securely; it will not be shown again"))
}

/// List a device's biometric tokens
///
/// Includes revoked tokens. Hashes are never returned.
#[utoipa::path(
    get,
    path = "/api/v1/devices/{device_id}/biometric-tokens",
    tag = "Biometric Tokens",
    params(
        ("device_id" = String, Path, description = "Device ID")
    ),
    responses(
        (status = 200, description = "Tokens of the device", body = Vec<BiometricTokenResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_biometric_tokens_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(device_id): ApiPath<Uuid>,
) -> Result<ApiResponse<Vec<BiometricTokenResponse>>, ApiError> {
    let device = owned_device(&state, auth.id(), device_id).await?;
    let tokens = state.store.list_biometric_tokens(device.id).await?;

    Ok(ApiResponse::ok(
        tokens.into_iter().map(BiometricTokenResponse::from).collect(),
    ))
}

/// Rotate a biometric token
///
/// Replaces the stored hash, resets the attempt counter and extends expiry
/// by 30 days. The previous raw token stops working immediately.
#[utoipa::path(
    post,
    path = "/api/v1/biometric-tokens/{token_id}/rotate",
    tag = "Biometric Tokens",
    params(
        ("token_id" = String, Path, description = "Biometric token ID")
    ),
    responses(
        (status = 200, description = "Token rotated", body = IssuedBiometricTokenResponse),
        (status = 400, description = "Token is inactive"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Token not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rotate_biometric_token_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(token_id): ApiPath<Uuid>,
) -> Result<ApiResponse<IssuedBiometricTokenResponse>, ApiError> {
    let token = owned_token(&state, auth.id(), token_id).await?;
    if !token.is_active {
        return Err(ApiError::bad_request("Cannot rotate an inactive token"));
    }

    let (input, raw) =
        NewBiometricToken::issue(token.user_id, token.device_id, token.biometric_type, Utc::now())?;
    let token = state
        .store
        .rotate_biometric_token(token.id, &input.token_hash, input.expires_at)
        .await?
        .ok_or_else(|| ApiError::bad_request("Cannot rotate an inactive token"))?;

    tracing::info!(token_id = %token.id, "Biometric token rotated");

    Ok(ApiResponse::ok(IssuedBiometricTokenResponse {
        token: BiometricTokenResponse::from(token),
        raw_token: raw.expose_secret().to_string(),
    })
    .with_message("Token rotated"))
}

/// Revoke a biometric token
#[utoipa::path(
    delete,
    path = "/api/v1/biometric-tokens/{token_id}",
    tag = "Biometric Tokens",
    params(
        ("token_id" = String, Path, description = "Biometric token ID")
    ),
    responses(
        (status = 200, description = "Token revoked", body = RevokeTokenResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Token not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn revoke_biometric_token_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiPath(token_id): ApiPath<Uuid>,
) -> Result<ApiResponse<RevokeTokenResponse>, ApiError> {
    let token = owned_token(&state, auth.id(), token_id).await?;
    let revoked = state.store.deactivate_biometric_token(token.id).await?;

    tracing::info!(token_id = %token.id, revoked, "Biometric token revoked");
    Ok(ApiResponse::ok(RevokeTokenResponse { revoked }))
}
