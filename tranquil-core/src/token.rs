//! Opaque biometric credential handles.
//!
//! A biometric token is a random secret handed to the device once. The server
//! keeps only its SHA3-256 hash, so a database leak does not disclose usable
//! credentials.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};

/// Lifetime of a biometric token after creation or rotation.
pub const TOKEN_LIFETIME_DAYS: i64 = 30;

/// Random bytes behind each raw token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Biometric modality bound to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometricType {
    FaceId,
    TouchId,
    Fingerprint,
    Face,
    Iris,
}

impl BiometricType {
    pub const ALL: [BiometricType; 5] = [
        BiometricType::FaceId,
        BiometricType::TouchId,
        BiometricType::Fingerprint,
        BiometricType::Face,
        BiometricType::Iris,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BiometricType::FaceId => "face_id",
            BiometricType::TouchId => "touch_id",
            BiometricType::Fingerprint => "fingerprint",
            BiometricType::Face => "face",
            BiometricType::Iris => "iris",
        }
    }
}

impl fmt::Display for BiometricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BiometricType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        BiometricType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "biometric type",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for BiometricType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A freshly generated raw token. Wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RawToken(String);

impl RawToken {
    /// Generate a new token from the operating system RNG.
    pub fn generate() -> Result<Self> {
        let bytes = random_bytes::<TOKEN_BYTES>()?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// The secret value, to be disclosed to the client exactly once.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Hash suitable for storage.
    pub fn hash(&self) -> String {
        hash_token(&self.0)
    }
}

impl fmt::Debug for RawToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawToken(<redacted>)")
    }
}

/// SHA3-256 of a raw secret, hex-encoded.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a presented raw token against a stored hash in constant time.
pub fn verify_token(raw: &str, stored_hash: &str) -> bool {
    hash_token(raw)
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}

/// Expiry for a token created or rotated at `issued_at`.
pub fn token_expiry(issued_at: DateTime<Utc>) -> DateTime<Utc> {
    issued_at + Duration::days(TOKEN_LIFETIME_DAYS)
}

/// A token is valid while active and not past its expiry (if any).
pub fn is_token_valid(is_active: bool, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    is_active && expires_at.map_or(true, |expires| expires > now)
}

pub(crate) fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    getrandom::fill(&mut buf).map_err(|e| CoreError::Entropy(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = RawToken::generate().unwrap();
        let b = RawToken::generate().unwrap();

        assert_ne!(a.expose_secret(), b.expose_secret());
        // 32 bytes -> 43 base64url characters without padding
        assert_eq!(a.expose_secret().len(), 43);
        assert!(a
            .expose_secret()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_hash_is_sha3_hex_and_stable() {
        let hash = hash_token("secret");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("secret"));
        assert_ne!(hash, hash_token("Secret"));
    }

    #[test]
    fn test_verify_token() {
        let token = RawToken::generate().unwrap();
        let stored = token.hash();

        assert!(verify_token(token.expose_secret(), &stored));
        assert!(!verify_token("not-the-token", &stored));
        assert!(!verify_token(token.expose_secret(), ""));
    }

    #[test]
    fn test_verify_token_rejects_near_miss_hashes() {
        let stored = hash_token("secret");
        let mut flipped = stored.clone().into_bytes();
        flipped[63] = if flipped[63] == b'0' { b'1' } else { b'0' };
        let flipped = String::from_utf8(flipped).unwrap();

        assert!(!verify_token("secret", &flipped));
        assert!(!verify_token("secret", &stored[..63]));
        assert!(verify_token("secret", &stored));
    }

    #[test]
    fn test_expiry_is_thirty_days() {
        let now = Utc::now();
        assert_eq!(token_expiry(now) - now, Duration::days(30));
    }

    #[test]
    fn test_token_validity() {
        let now = Utc::now();
        let future = now + Duration::hours(1);
        let past = now - Duration::seconds(1);

        assert!(is_token_valid(true, Some(future), now));
        assert!(is_token_valid(true, None, now));
        assert!(!is_token_valid(true, Some(past), now));
        assert!(!is_token_valid(true, Some(now), now));
        assert!(!is_token_valid(false, Some(future), now));
        assert!(!is_token_valid(false, None, now));
    }

    #[test]
    fn test_biometric_type_text_conversion() {
        for t in BiometricType::ALL {
            assert_eq!(t.as_str().parse::<BiometricType>().unwrap(), t);
        }
        assert_eq!(
            serde_json::to_string(&BiometricType::FaceId).unwrap(),
            "\"face_id\""
        );
        assert!("retina".parse::<BiometricType>().is_err());
    }

    #[test]
    fn test_raw_token_debug_is_redacted() {
        let token = RawToken::generate().unwrap();
        let debug = format!("{:?}", token);
        assert!(!debug.contains(token.expose_secret()));
    }
}
