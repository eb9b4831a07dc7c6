//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::db::{MemoryStore, Store};

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend (PostgreSQL or in-memory)
    pub store: Arc<dyn Store>,
    /// Session token keys
    pub jwt: Arc<JwtKeys>,
    /// Backup codes issued per batch
    pub backup_code_count: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt: JwtKeys, backup_code_count: usize) -> Self {
        Self {
            store,
            jwt: Arc::new(jwt),
            backup_code_count,
        }
    }

    /// State backed by a fresh in-memory store (development and tests).
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            JwtKeys::new(jwt_secret, 24),
            tranquil_core::BACKUP_CODE_COUNT,
        )
    }
}
