//! Password hashing.
//!
//! Stored form is `hex(salt) ":" hex(key)`: a 16-byte random salt and the
//! 32-byte Argon2id key derived from the password with that salt.

use argon2::Argon2;
use rand::RngCore;
use subtle::ConstantTimeEq;
use thiserror::Error;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const DELIMITER: char = ':';

/// Well-formed stored hash that no password derives to (all-zero key).
///
/// Verified against when the account does not exist, so a failed login
/// costs one key derivation either way.
pub(crate) const UNMATCHABLE_HASH: &str = concat!(
    "00000000000000000000000000000000",
    ":",
    "0000000000000000000000000000000000000000000000000000000000000000",
);

/// Errors produced while hashing a password.
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Argon2 rejected its inputs.
    #[error("key derivation failed: {0}")]
    Derive(String),

    /// The blocking hashing task panicked or was cancelled.
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Hash a password with a fresh random salt.
///
/// This is CPU- and memory-heavy; async callers should use
/// [`hash_password_blocking`].
///
/// # Errors
///
/// Returns `PasswordHashError::Derive` if Argon2 rejects the parameters.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let mut salt = [0_u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let key = derive_key(password, &salt).map_err(|e| PasswordHashError::Derive(e.to_string()))?;

    Ok(format!(
        "{}{DELIMITER}{}",
        hex::encode(salt),
        hex::encode(key)
    ))
}

/// Check a password against a stored hash in constant time.
///
/// Any malformed stored form (missing delimiter, bad hex, wrong salt or key
/// length) yields `false`.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, key_hex)) = stored.split_once(DELIMITER) else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(key_hex)) else {
        return false;
    };
    if salt.len() != SALT_LEN || expected.len() != KEY_LEN {
        return false;
    }

    let Ok(actual) = derive_key(password, &salt) else {
        return false;
    };

    actual.as_slice().ct_eq(expected.as_slice()).into()
}

/// [`hash_password`] on the blocking thread pool.
///
/// # Errors
///
/// Returns `PasswordHashError` if hashing fails or the task is cancelled.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordHashError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// [`verify_password`] on the blocking thread pool.
///
/// # Errors
///
/// Returns `PasswordHashError::Join` if the task is cancelled.
pub async fn verify_password_blocking(
    password: String,
    stored: String,
) -> Result<bool, PasswordHashError> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await?)
}

fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], argon2::Error> {
    let mut key = [0_u8; KEY_LEN];
    Argon2::default().hash_password_into(password.as_bytes(), salt, &mut key)?;
    Ok(key)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let stored = hash_password("tuna-roll-42").unwrap();
        assert!(verify_password("tuna-roll-42", &stored));
        assert!(!verify_password("tuna-roll-43", &stored));
    }

    #[test]
    fn test_stored_form_layout() {
        let stored = hash_password("secret").unwrap();
        let (salt, key) = stored.split_once(':').unwrap();
        assert_eq!(salt.len(), SALT_LEN * 2);
        assert_eq!(key.len(), KEY_LEN * 2);
        assert!(stored.bytes().filter(|b| *b == b':').count() == 1);
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unmatchable_hash_is_well_formed() {
        let (salt, key) = UNMATCHABLE_HASH.split_once(DELIMITER).unwrap();
        assert_eq!(hex::decode(salt).unwrap().len(), SALT_LEN);
        assert_eq!(hex::decode(key).unwrap().len(), KEY_LEN);
        assert!(!verify_password("", UNMATCHABLE_HASH));
        assert!(!verify_password("admin123", UNMATCHABLE_HASH));
    }

    #[test]
    fn test_malformed_stored_form_is_false() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "no-delimiter"));
        assert!(!verify_password("pw", "zz:zz"));
        assert!(!verify_password("pw", "abcd:abcd"));
        let stored = hash_password("pw").unwrap();
        let truncated = &stored[..stored.len() - 2];
        assert!(!verify_password("pw", truncated));
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let stored = hash_password_blocking("maki".to_owned()).await.unwrap();
        assert!(verify_password_blocking("maki".to_owned(), stored.clone()).await.unwrap());
        assert!(!verify_password_blocking("nigiri".to_owned(), stored).await.unwrap());
    }
}
