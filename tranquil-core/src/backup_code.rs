//! One-time fallback codes.
//!
//! Codes are eight symbols from an alphabet without look-alike characters,
//! shown to the user as `XXXX-XXXX`. Only a hash and a masked partial are
//! persisted.

use chrono::{DateTime, Duration, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};
use crate::token::{hash_token, random_bytes};

/// Codes issued per batch unless configured otherwise.
pub const BACKUP_CODE_COUNT: usize = 10;

/// Lifetime of an unused backup code.
pub const BACKUP_CODE_LIFETIME_DAYS: i64 = 365;

/// Symbols in a code.
pub const BACKUP_CODE_LENGTH: usize = 8;

/// 32 symbols, so `byte % 32` carries no modulo bias.
const ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A generated code together with its storage representation.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct GeneratedBackupCode {
    code: String,
    #[zeroize(skip)]
    hash: String,
    #[zeroize(skip)]
    partial: String,
}

impl GeneratedBackupCode {
    /// Display form (`XXXX-XXXX`), disclosed once.
    pub fn display(&self) -> String {
        format!("{}-{}", &self.code[..4], &self.code[4..])
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn partial(&self) -> &str {
        &self.partial
    }
}

impl std::fmt::Debug for GeneratedBackupCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedBackupCode")
            .field("partial", &self.partial)
            .finish_non_exhaustive()
    }
}

/// Generate a batch of `count` distinct codes.
pub fn generate_backup_codes(count: usize) -> Result<Vec<GeneratedBackupCode>> {
    let mut codes: Vec<GeneratedBackupCode> = Vec::with_capacity(count);

    while codes.len() < count {
        let bytes = random_bytes::<BACKUP_CODE_LENGTH>()?;
        let code: String = bytes
            .iter()
            .map(|b| ALPHABET[(*b as usize) % ALPHABET.len()] as char)
            .collect();

        if codes.iter().any(|existing| existing.code == code) {
            continue;
        }

        codes.push(GeneratedBackupCode {
            hash: hash_backup_code(&code),
            partial: code_partial(&code),
            code,
        });
    }

    Ok(codes)
}

/// Canonical form of user input: trimmed, uppercased, separators removed.
pub fn normalize_backup_code(input: &str) -> Result<String> {
    let normalized: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.len() != BACKUP_CODE_LENGTH
        || !normalized.bytes().all(|b| ALPHABET.contains(&b))
    {
        return Err(CoreError::MalformedBackupCode);
    }

    Ok(normalized)
}

/// Hash of a normalized code.
pub fn hash_backup_code(normalized: &str) -> String {
    hash_token(normalized)
}

/// Masked representation keeping the last four symbols.
pub fn code_partial(normalized: &str) -> String {
    let tail_start = normalized.len().saturating_sub(4);
    format!("****-{}", &normalized[tail_start..])
}

/// Expiry for codes issued at `issued_at`.
pub fn backup_code_expiry(issued_at: DateTime<Utc>) -> DateTime<Utc> {
    issued_at + Duration::days(BACKUP_CODE_LIFETIME_DAYS)
}

/// Whether a code may still be redeemed.
pub fn is_redeemable(is_used: bool, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    !is_used && expires_at.map_or(true, |expires| expires > now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_batch() {
        let codes = generate_backup_codes(BACKUP_CODE_COUNT).unwrap();
        assert_eq!(codes.len(), BACKUP_CODE_COUNT);

        for code in &codes {
            let display = code.display();
            assert_eq!(display.len(), 9);
            assert_eq!(&display[4..5], "-");

            let normalized = normalize_backup_code(&display).unwrap();
            assert_eq!(hash_backup_code(&normalized), code.hash());
            assert!(code.partial().starts_with("****-"));
            assert!(display.ends_with(&code.partial()[5..]));
        }

        let mut hashes: Vec<_> = codes.iter().map(|c| c.hash().to_string()).collect();
        hashes.sort();
        hashes.dedup();
        assert_eq!(hashes.len(), codes.len(), "codes in a batch must be distinct");
    }

    #[test]
    fn test_normalize_accepts_user_formatting() {
        assert_eq!(normalize_backup_code("abcd-efgh").unwrap(), "ABCDEFGH");
        assert_eq!(normalize_backup_code("  ABCD EFGH ").unwrap(), "ABCDEFGH");
        assert_eq!(normalize_backup_code("ABCDEFGH").unwrap(), "ABCDEFGH");
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        assert!(normalize_backup_code("").is_err());
        assert!(normalize_backup_code("ABC-DEF").is_err());
        assert!(normalize_backup_code("ABCD-EFGH-J").is_err());
        // 0, O, 1 and I are not part of the alphabet
        assert!(normalize_backup_code("ABCD-EFG0").is_err());
        assert!(normalize_backup_code("ABCD-EFGI").is_err());
    }

    #[test]
    fn test_code_partial() {
        assert_eq!(code_partial("ABCDEFGH"), "****-EFGH");
    }

    #[test]
    fn test_is_redeemable() {
        let now = Utc::now();
        assert!(is_redeemable(false, None, now));
        assert!(is_redeemable(false, Some(backup_code_expiry(now)), now));
        assert!(!is_redeemable(true, None, now));
        assert!(!is_redeemable(false, Some(now - Duration::days(1)), now));
    }
}
