//! Backup code handlers

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tranquil_core::{backup_code_expiry, generate_backup_codes};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::db::{BackupCodeResponse, NewBackupCode};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Freshly generated codes, shown once
#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedBackupCodesResponse {
    /// Codes in display form (`XXXX-XXXX`)
    #[schema(example = json!(["K7PM-4XQ2", "9HWD-TB3N"]))]
    pub codes: Vec<String>,
    pub count: usize,
    #[schema(value_type = String)]
    pub expires_at: DateTime<Utc>,
}

/// Masked view of the user's codes
#[derive(Debug, Serialize, ToSchema)]
pub struct BackupCodeListResponse {
    pub codes: Vec<BackupCodeResponse>,
    /// Codes that can still be redeemed
    pub remaining: usize,
}

/// Generate a new set of backup codes
///
/// Unused codes from earlier batches are discarded. Used codes are kept for
/// the record.
#[utoipa::path(
    post,
    path = "/api/v1/backup-codes",
    tag = "Backup Codes",
    responses(
        (status = 201, description = "Codes generated", body = GeneratedBackupCodesResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_backup_codes_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<ApiResponse<GeneratedBackupCodesResponse>, ApiError> {
    let now = Utc::now();
    let generated = generate_backup_codes(state.backup_code_count)?;

    let rows = generated
        .iter()
        .map(|code| NewBackupCode::from_generated(code, now))
        .collect();
    state.store.replace_backup_codes(auth.id(), rows).await?;

    tracing::info!(user_id = %auth.id(), count = generated.len(), "Backup codes generated");

    Ok(ApiResponse::created(GeneratedBackupCodesResponse {
        count: generated.len(),
        codes: generated.iter().map(|code| code.display()).collect(),
        expires_at: backup_code_expiry(now),
    })
    .with_message("Store these codes somewhere safe; they will not be shown again"))
}

/// List backup codes (masked)
#[utoipa::path(
    get,
    path = "/api/v1/backup-codes",
    tag = "Backup Codes",
    responses(
        (status = 200, description = "Masked codes", body = BackupCodeListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_backup_codes_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<ApiResponse<BackupCodeListResponse>, ApiError> {
    let now = Utc::now();
    let codes = state.store.list_backup_codes(auth.id()).await?;
    let remaining = codes.iter().filter(|code| code.is_redeemable(now)).count();

    Ok(ApiResponse::ok(BackupCodeListResponse {
        codes: codes.into_iter().map(BackupCodeResponse::from).collect(),
        remaining,
    }))
}
