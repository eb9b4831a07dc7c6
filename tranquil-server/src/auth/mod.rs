//! JWT authentication module
//!
//! Provides the `AuthenticatedUser` extractor for Axum handlers. Session
//! tokens are HS256 JWTs signed with the server secret (see [`jwt`]).

pub mod jwt;
pub mod password;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::db::User;
use crate::error::ApiError;
use crate::state::AppState;

pub use jwt::{Claims, JwtKeys};
pub use password::{hash_password, verify_password};

/// Extract the Bearer token from the Authorization header
fn extract_bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| {
            ApiError::auth_error("AUTH_MISSING_TOKEN", "Missing Authorization header")
        })?;

    let auth_value = auth_header.to_str().map_err(|_| {
        ApiError::auth_error(
            "AUTH_INVALID_TOKEN",
            "Invalid Authorization header encoding",
        )
    })?;

    auth_value.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::auth_error(
            "AUTH_INVALID_TOKEN",
            "Authorization header must use Bearer scheme",
        )
    })
}

/// Authenticated user extractor that validates the JWT and resolves the user.
///
/// The extractor:
/// 1. Reads `Authorization: Bearer <token>` header
/// 2. Validates signature and expiry
/// 3. Looks up the live user by the `sub` claim
///
/// Returns 401 with structured error codes on any failure.
pub struct AuthenticatedUser {
    pub user: User,
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)?;
        let claims = state.jwt.validate(token)?;

        let user = state
            .store
            .find_user_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                ApiError::auth_error(
                    "AUTH_USER_NOT_FOUND",
                    "Valid token but user not found",
                )
            })?;

        Ok(AuthenticatedUser { user, claims })
    }
}
