//! Password hashing (Argon2id, PHC string format)
//!
//! The async helpers run Argon2 on the blocking pool.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::ApiError;

/// Hash compared against when a login names no known account.
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hash a plaintext password using Argon2.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// [`hash_password`] on the blocking pool.
pub async fn hash(password: String) -> Result<String, ApiError> {
    blocking(move || hash_password(&password)).await
}

/// [`verify_password`] on the blocking pool.
pub async fn verify(password: String, hash: String) -> Result<bool, ApiError> {
    blocking(move || verify_password(&password, &hash)).await
}

/// Spend the same Argon2 work as a real verification, then discard the result.
pub async fn verify_dummy(password: String) -> Result<(), ApiError> {
    blocking(move || {
        let hash = dummy_hash()?;
        verify_password(&password, hash).map(|_| ())
    })
    .await
}

fn dummy_hash() -> Result<&'static str, ApiError> {
    if let Some(hash) = DUMMY_HASH.get() {
        return Ok(hash);
    }
    let hash = hash_password("tranquil-no-such-account")?;
    Ok(DUMMY_HASH.get_or_init(|| hash))
}

async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("Password task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_is_internal_error() {
        let err = verify_password("x", "not-a-phc-string").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_blocking_pool_helpers() {
        let stored = hash("correct horse battery".to_string()).await.unwrap();
        assert!(verify("correct horse battery".to_string(), stored.clone())
            .await
            .unwrap());
        assert!(!verify("wrong".to_string(), stored).await.unwrap());
    }

    #[tokio::test]
    async fn test_dummy_verification_succeeds_without_account() {
        verify_dummy("anything".to_string()).await.unwrap();
        // Second call reuses the cached hash
        verify_dummy("anything else".to_string()).await.unwrap();
        assert!(DUMMY_HASH.get().unwrap().starts_with("$argon2id$"));
    }
}
