//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header, Method, StatusCode},
    routing::{delete, get, post, put},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::handlers::{
    backup_code_login_handler, biometric_login_handler, create_biometric_token_handler,
    delete_device_handler, delete_user_handler, generate_backup_codes_handler,
    get_current_user_handler, get_device_handler, get_trust_score_handler, health,
    heartbeat_handler, list_auth_logs_handler, list_backup_codes_handler,
    list_biometric_tokens_handler, list_devices_handler, login_handler, ready,
    register_device_handler, register_handler, revoke_biometric_token_handler,
    rotate_biometric_token_handler, set_biometrics_handler, set_trust_handler,
    update_capabilities_handler, update_current_user_handler, update_trust_score_handler,
};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the application router with default config (for testing)
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, &Config::default())
}

/// `/api/v1` routes
fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/biometric", post(biometric_login_handler))
        .route("/auth/backup-code", post(backup_code_login_handler))
        // Current user
        .route(
            "/users/me",
            get(get_current_user_handler)
                .patch(update_current_user_handler)
                .delete(delete_user_handler),
        )
        // Devices
        .route(
            "/devices",
            post(register_device_handler).get(list_devices_handler),
        )
        .route(
            "/devices/{device_id}",
            get(get_device_handler).delete(delete_device_handler),
        )
        .route(
            "/devices/{device_id}/capabilities",
            put(update_capabilities_handler),
        )
        .route("/devices/{device_id}/heartbeat", post(heartbeat_handler))
        .route("/devices/{device_id}/trust", put(set_trust_handler))
        .route("/devices/{device_id}/biometrics", put(set_biometrics_handler))
        .route(
            "/devices/{device_id}/trust-score",
            get(get_trust_score_handler).put(update_trust_score_handler),
        )
        // Biometric tokens
        .route(
            "/devices/{device_id}/biometric-tokens",
            post(create_biometric_token_handler).get(list_biometric_tokens_handler),
        )
        .route(
            "/biometric-tokens/{token_id}/rotate",
            post(rotate_biometric_token_handler),
        )
        .route(
            "/biometric-tokens/{token_id}",
            delete(revoke_biometric_token_handler),
        )
        // Backup codes and audit trail
        .route(
            "/backup-codes",
            post(generate_backup_codes_handler).get(list_backup_codes_handler),
        )
        .route("/auth-logs", get(list_auth_logs_handler))
}

/// Create the application router with custom configuration
pub fn create_router_with_config(state: AppState, config: &Config) -> Router {
    // Configure CORS based on allowed_origins
    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!("CORS: Restricting to {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        }
        _ => {
            tracing::warn!("CORS: Allowing all origins (dev mode)");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    // Request body limit
    let body_limit = RequestBodyLimitLayer::new(config.body_limit_kb * 1024);

    // Request timeout
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    // Base router with common layers
    let router = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .nest("/api/v1", api_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(body_limit)
        .layer(timeout);

    // Conditionally apply rate limiting (disabled in tests, enabled in production)
    if !config.rate_limit_enabled {
        tracing::warn!("Rate limiting: DISABLED");
        return router.layer(TraceLayer::new_for_http());
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(config.rate_limit_per_sec)
        .burst_size(config.rate_limit_burst)
        .finish();

    match governor_conf {
        Some(governor_conf) => {
            tracing::info!(
                "Rate limiting: {} req/s (burst: {})",
                config.rate_limit_per_sec,
                config.rate_limit_burst
            );
            router
                .layer(GovernorLayer::new(Arc::new(governor_conf)))
                .layer(TraceLayer::new_for_http())
        }
        None => {
            tracing::error!(
                per_sec = config.rate_limit_per_sec,
                burst = config.rate_limit_burst,
                "Invalid rate limit settings, rate limiting DISABLED"
            );
            router.layer(TraceLayer::new_for_http())
        }
    }
}
