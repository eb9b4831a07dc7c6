//! Authentication audit trail handler

use axum::extract::State;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::AuthenticatedUser;
use crate::db::AuthLog;
use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Query parameters for listing audit entries
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthLogQuery {
    /// Maximum entries to return (1-200, default 50)
    pub limit: Option<i64>,
}

impl AuthLogQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// List recent authentication attempts
///
/// Both successful and failed attempts, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/auth-logs",
    tag = "Auth Logs",
    params(AuthLogQuery),
    responses(
        (status = 200, description = "Audit entries", body = Vec<AuthLog>),
        (status = 400, description = "Invalid query"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_auth_logs_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ApiQuery(query): ApiQuery<AuthLogQuery>,
) -> Result<ApiResponse<Vec<AuthLog>>, ApiError> {
    let logs = state.store.list_auth_logs(auth.id(), query.limit()).await?;
    Ok(ApiResponse::ok(logs))
}
