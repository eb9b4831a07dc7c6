//! Tranquil Core - device trust and biometric authentication rules
//!
//! This crate holds the pure domain logic behind the Tranquil backend:
//!
//! - Security level derivation from device capability flags
//! - The biometric eligibility predicate
//! - Opaque biometric token generation, hashing and validity
//! - One-time backup code generation and normalisation
//! - Authentication audit vocabulary and trust score bounds
//!
//! Nothing here performs I/O; persistence lives in `tranquil-server`.
//!
//! # Example
//!
//! ```
//! use tranquil_core::{DeviceCapabilities, RawToken, SecurityLevel, verify_token};
//!
//! let caps = DeviceCapabilities::new(true, true, false);
//! assert_eq!(caps.security_level(), SecurityLevel::Premium);
//!
//! let token = RawToken::generate()?;
//! let stored = token.hash();
//! assert!(verify_token(token.expose_secret(), &stored));
//! # Ok::<(), tranquil_core::CoreError>(())
//! ```

pub mod audit;
pub mod backup_code;
pub mod device;
pub mod error;
pub mod token;
pub mod trust;

pub use audit::{AuthMethod, AuthOutcome, FailureReason};
pub use backup_code::{
    backup_code_expiry, code_partial, generate_backup_codes, hash_backup_code, is_redeemable,
    normalize_backup_code, GeneratedBackupCode, BACKUP_CODE_COUNT, BACKUP_CODE_LIFETIME_DAYS,
};
pub use device::{calculate_security_level, can_use_biometrics, DeviceCapabilities, SecurityLevel};
pub use error::{CoreError, Result};
pub use token::{
    hash_token, is_token_valid, token_expiry, verify_token, BiometricType, RawToken,
    TOKEN_LIFETIME_DAYS,
};
pub use trust::{TrustScores, DEFAULT_SCORE, HIGH_TRUST_THRESHOLD};

/// Generate a URL-safe random secret of `bytes` bytes (e.g. a JWT signing key).
pub fn generate_secret(bytes: usize) -> Result<String> {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let mut buf = vec![0u8; bytes];
    getrandom::fill(&mut buf).map_err(|e| CoreError::Entropy(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(&buf))
}
