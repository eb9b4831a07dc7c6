//! Authentication handlers
//!
//! Registration plus the three login methods (password, biometric token,
//! backup code). Every attempt against a known user is written to the
//! audit trail.

use axum::{extract::State, http::HeaderMap};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tranquil_core::{
    hash_backup_code, normalize_backup_code, AuthMethod, BiometricType, FailureReason,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::password;
use crate::db::{BackupCodeRedemption, NewAuthLog, NewUser, TokenCheck, User, UserDevice, UserResponse};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::validation::{
    client_ip, normalize_email, normalize_name, user_agent, validate_password,
};

/// Request for creating an account
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
    #[serde(default)]
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
}

/// Request for password login
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "user@example.com")]
    pub email: String,
    pub password: String,
    /// Registered device the session is opened from
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub device_id: Option<Uuid>,
}

/// Request for biometric login
#[derive(Debug, Deserialize, ToSchema)]
pub struct BiometricLoginRequest {
    #[schema(value_type = String)]
    pub device_id: Uuid,
    /// face_id | touch_id | fingerprint | face | iris
    #[schema(value_type = String, example = "face_id")]
    pub biometric_type: BiometricType,
    /// Raw token returned when the biometric token was created or rotated
    pub token: String,
}

/// Request for backup code login
#[derive(Debug, Deserialize, ToSchema)]
pub struct BackupCodeLoginRequest {
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Code as shown to the user; case, dashes and spaces are ignored
    #[schema(example = "K7PM-4XQ2")]
    pub code: String,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub device_id: Option<Uuid>,
}

/// Session issued on successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Bearer token for the `Authorization` header
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: &'static str,
    /// Token lifetime in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Client metadata recorded with each attempt
struct Client {
    ip: Option<String>,
    user_agent: Option<String>,
}

impl Client {
    fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip: client_ip(headers),
            user_agent: user_agent(headers),
        }
    }
}

fn session(state: &AppState, user: User, device_id: Option<Uuid>) -> Result<SessionResponse, ApiError> {
    Ok(SessionResponse {
        access_token: state.jwt.issue(user.id, device_id)?,
        token_type: "Bearer",
        expires_in: state.jwt.expires_in(),
        user: UserResponse::from(user),
    })
}

/// Final trust score of a device, if it has one.
async fn trust_score_of(state: &AppState, device_id: Uuid) -> Result<Option<f64>, ApiError> {
    Ok(state
        .store
        .get_trust_score(device_id)
        .await?
        .map(|score| score.final_score))
}

/// Live account behind a login email. A malformed address finds nothing.
async fn login_user(state: &AppState, email: &str) -> Result<Option<User>, ApiError> {
    match normalize_email(email) {
        Ok(email) => Ok(state.store.find_user_by_email(&email).await?),
        Err(_) => Ok(None),
    }
}

/// The referenced device when it belongs to the user, otherwise `None`.
async fn session_device(
    state: &AppState,
    user_id: Uuid,
    device_id: Option<Uuid>,
) -> Result<Option<UserDevice>, ApiError> {
    let Some(device_id) = device_id else {
        return Ok(None);
    };
    Ok(state
        .store
        .find_device(device_id)
        .await?
        .filter(|device| device.user_id == user_id))
}

/// Build an audit entry, attaching device, trust score and client metadata.
async fn audit_entry(
    state: &AppState,
    entry: NewAuthLog,
    device: Option<&UserDevice>,
    client: &Client,
) -> Result<NewAuthLog, ApiError> {
    let entry = entry.with_client(client.ip.clone(), client.user_agent.clone());
    match device {
        Some(device) => {
            let score = trust_score_of(state, device.id).await?;
            Ok(entry.with_device(device.id, score))
        }
        None => Ok(entry),
    }
}

async fn record(
    state: &AppState,
    entry: NewAuthLog,
    device: Option<&UserDevice>,
    client: &Client,
) -> Result<(), ApiError> {
    let entry = audit_entry(state, entry, device, client).await?;
    state.store.append_auth_log(entry).await?;
    Ok(())
}

/// Record a failed attempt and hand back the error to return.
async fn reject(
    state: &AppState,
    user_id: Uuid,
    method: AuthMethod,
    reason: FailureReason,
    device: Option<&UserDevice>,
    client: &Client,
    error: ApiError,
) -> ApiError {
    tracing::warn!(
        user_id = %user_id,
        method = %method,
        reason = %reason,
        "Authentication attempt failed"
    );
    match record(state, NewAuthLog::failure(user_id, method, reason), device, client).await {
        Ok(()) => error,
        Err(log_error) => log_error,
    }
}

/// Mark the device seen and log the successful attempt.
async fn accept(
    state: &AppState,
    user_id: Uuid,
    method: AuthMethod,
    device: Option<&UserDevice>,
    client: &Client,
) -> Result<(), ApiError> {
    if let Some(device) = device {
        state
            .store
            .touch_device(device.id, client.ip.as_deref())
            .await?;
    }
    record(state, NewAuthLog::success(user_id, method), device, client).await?;
    tracing::info!(user_id = %user_id, method = %method, "User authenticated");
    Ok(())
}

/// Create an account
///
/// Stores an Argon2 hash of the password and opens a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Invalid email, password or name"),
        (status = 409, description = "Email is already registered")
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<SessionResponse>, ApiError> {
    let email = normalize_email(&request.email)?;
    validate_password(&request.password)?;
    let name = normalize_name(request.name.as_deref())?;

    let user = state
        .store
        .create_user(NewUser {
            email,
            password_hash: password::hash(request.password).await?,
            name,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(ApiResponse::created(session(&state, user, None)?).with_message("Registration successful"))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = SessionResponse),
        (status = 401, description = "Invalid email, password or device")
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<ApiResponse<SessionResponse>, ApiError> {
    let client = Client::from_headers(&headers);
    let invalid = || ApiError::auth_error("AUTH_INVALID_CREDENTIALS", "Invalid email or password");
    let method = AuthMethod::Password;

    let Some(user) = login_user(&state, &request.email).await? else {
        password::verify_dummy(request.password).await?;
        return Err(invalid());
    };

    let device = session_device(&state, user.id, request.device_id).await?;

    if !password::verify(request.password, user.password_hash.clone()).await? {
        return Err(reject(
            &state,
            user.id,
            method,
            FailureReason::InvalidPassword,
            device.as_ref(),
            &client,
            invalid(),
        )
        .await);
    }

    if request.device_id.is_some() && device.is_none() {
        return Err(reject(
            &state,
            user.id,
            method,
            FailureReason::UnknownDevice,
            None,
            &client,
            invalid(),
        )
        .await);
    }

    accept(&state, user.id, method, device.as_ref(), &client).await?;
    let device_id = device.map(|d| d.id);
    Ok(ApiResponse::ok(session(&state, user, device_id)?).with_message("Login successful"))
}

/// Log in with a biometric token
///
/// The device must currently allow biometrics. Every attempt increments the
/// token's challenge counter; success also bumps its usage counter.
#[utoipa::path(
    post,
    path = "/api/v1/auth/biometric",
    tag = "Auth",
    request_body = BiometricLoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = SessionResponse),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Unknown device, token or mismatch"),
        (status = 403, description = "Biometrics not available on this device")
    )
)]
pub async fn biometric_login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<BiometricLoginRequest>,
) -> Result<ApiResponse<SessionResponse>, ApiError> {
    let client = Client::from_headers(&headers);
    let failed = || ApiError::auth_error("AUTH_BIOMETRIC_FAILED", "Biometric authentication failed");

    let device = state
        .store
        .find_device(request.device_id)
        .await?
        .ok_or_else(failed)?;
    let user = state
        .store
        .find_user_by_id(device.user_id)
        .await?
        .ok_or_else(failed)?;
    let method = AuthMethod::Biometric;

    if !device.can_use_biometrics() {
        return Err(reject(
            &state,
            user.id,
            method,
            FailureReason::BiometricsUnavailable,
            Some(&device),
            &client,
            ApiError::forbidden("Biometric authentication is not available on this device"),
        )
        .await);
    }

    let Some(token) = state
        .store
        .find_active_biometric_token(device.id, request.biometric_type)
        .await?
    else {
        return Err(reject(
            &state,
            user.id,
            method,
            FailureReason::TokenNotFound,
            Some(&device),
            &client,
            failed(),
        )
        .await);
    };

    state.store.record_token_attempt(token.id).await?;

    match token.check(&request.token, Utc::now()) {
        TokenCheck::Valid => {
            state.store.record_token_usage(token.id).await?;
            accept(&state, user.id, method, Some(&device), &client).await?;
            Ok(ApiResponse::ok(session(&state, user, Some(device.id))?)
                .with_message("Biometric login successful"))
        }
        TokenCheck::Expired => Err(reject(
            &state,
            user.id,
            method,
            FailureReason::TokenExpired,
            Some(&device),
            &client,
            ApiError::auth_error("BIOMETRIC_TOKEN_EXPIRED", "Biometric token has expired"),
        )
        .await),
        TokenCheck::Mismatch => Err(reject(
            &state,
            user.id,
            method,
            FailureReason::TokenMismatch,
            Some(&device),
            &client,
            failed(),
        )
        .await),
    }
}

/// Log in with a one-time backup code
///
/// A code is consumed on success and can never be used again.
#[utoipa::path(
    post,
    path = "/api/v1/auth/backup-code",
    tag = "Auth",
    request_body = BackupCodeLoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = SessionResponse),
        (status = 400, description = "Malformed code"),
        (status = 401, description = "Unknown, used or expired code, or unknown device")
    )
)]
pub async fn backup_code_login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<BackupCodeLoginRequest>,
) -> Result<ApiResponse<SessionResponse>, ApiError> {
    let client = Client::from_headers(&headers);
    let invalid = || ApiError::auth_error("BACKUP_CODE_INVALID", "Invalid email or backup code");
    let method = AuthMethod::BackupCode;

    let code = normalize_backup_code(&request.code);

    let Some(user) = login_user(&state, &request.email).await? else {
        return Err(match code {
            Ok(_) => invalid(),
            Err(e) => e.into(),
        });
    };

    let device = session_device(&state, user.id, request.device_id).await?;

    let normalized = match code {
        Ok(code) => code,
        Err(e) => {
            return Err(reject(
                &state,
                user.id,
                method,
                FailureReason::MalformedCode,
                device.as_ref(),
                &client,
                e.into(),
            )
            .await)
        }
    };

    if request.device_id.is_some() && device.is_none() {
        return Err(reject(
            &state,
            user.id,
            method,
            FailureReason::UnknownDevice,
            None,
            &client,
            invalid(),
        )
        .await);
    }

    let redemption = state
        .store
        .redeem_backup_code(user.id, &hash_backup_code(&normalized))
        .await?;

    let (reason, error) = match redemption {
        BackupCodeRedemption::Redeemed(code) => {
            accept(&state, user.id, method, device.as_ref(), &client).await?;
            tracing::info!(user_id = %user.id, code = %code.code_partial, "Backup code redeemed");
            let device_id = device.map(|d| d.id);
            return Ok(ApiResponse::ok(session(&state, user, device_id)?)
                .with_message("Backup code accepted"));
        }
        BackupCodeRedemption::AlreadyUsed => (
            FailureReason::CodeAlreadyUsed,
            ApiError::auth_error("BACKUP_CODE_USED", "Backup code has already been used"),
        ),
        BackupCodeRedemption::Expired => (
            FailureReason::CodeExpired,
            ApiError::auth_error("BACKUP_CODE_EXPIRED", "Backup code has expired"),
        ),
        BackupCodeRedemption::NotFound => (FailureReason::CodeNotFound, invalid()),
    };

    Err(reject(&state, user.id, method, reason, device.as_ref(), &client, error).await)
}
