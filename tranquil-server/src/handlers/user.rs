//! Current user profile handlers

use axum::extract::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::db::{UpdateUser, UserResponse};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::validation::normalize_name;

/// Request for updating the current user's profile
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    /// New display name; empty or missing clears it
    #[serde(default)]
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
}

/// Response for delete user
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteUserResponse {
    /// Whether an account was deleted
    pub deleted: bool,
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_current_user_handler(
    auth: AuthenticatedUser,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    Ok(ApiResponse::ok(UserResponse::from(auth.user)))
}

/// Update current user profile
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    tag = "Users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_current_user_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let name = normalize_name(request.name.as_deref())?;

    let user = state
        .store
        .update_user(auth.id(), UpdateUser { name })
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::ok(UserResponse::from(user)).with_message("Profile updated"))
}

/// Delete current user account
///
/// Performs a soft delete. The email address is anonymised and freed for
/// re-registration. The account's devices are removed together with their
/// trust scores and biometric tokens, which frees their fingerprints. Audit
/// logs and backup codes stay attached to the anonymised record.
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Account deleted", body = DeleteUserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_user_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<ApiResponse<DeleteUserResponse>, ApiError> {
    let deleted = state.store.soft_delete_user(auth.id()).await?;

    tracing::info!(user_id = %auth.id(), deleted, "User account deleted");

    Ok(ApiResponse::ok(DeleteUserResponse { deleted }).with_message("Account deleted"))
}
