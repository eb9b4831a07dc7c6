//! CLI command implementations.

pub mod backup_codes;
pub mod hash;
pub mod level;
pub mod secret;
