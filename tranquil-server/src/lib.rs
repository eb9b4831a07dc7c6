//! Tranquil Server Library - REST API for accounts, device trust and biometric login
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod state;
pub mod validation;

pub use auth::{AuthenticatedUser, Claims, JwtKeys};
pub use config::Config;
pub use db::{
    AuthLog, BackupCode, BiometricToken, DeviceTrustScore, MemoryStore, PgStore, Store,
    StoreError, User, UserDevice,
};
pub use error::ApiError;
pub use openapi::ApiDoc;
pub use response::ApiResponse;
pub use routes::{create_router, create_router_with_config};
pub use state::AppState;
