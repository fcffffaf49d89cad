// SPDX-License-Identifier: MIT

//! Password hashing with PBKDF2-HMAC-SHA256.

use crate::error::AppError;
use crate::models::user::PasswordHash;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use std::num::NonZeroU32;

const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;
const ITERATIONS: u32 = 100_000;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<PasswordHash, AppError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;

    let mut credential = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        ALGORITHM,
        NonZeroU32::new(ITERATIONS).expect("nonzero iteration count"),
        &salt,
        password.as_bytes(),
        &mut credential,
    );

    Ok(PasswordHash {
        salt: hex::encode(salt),
        hash: hex::encode(credential),
    })
}

/// Verify a password against a stored hash. Constant-time comparison
/// is handled inside `ring`.
pub fn verify_password(password: &str, stored: &PasswordHash) -> bool {
    let Ok(salt) = hex::decode(&stored.salt) else {
        return false;
    };
    let Ok(expected) = hex::decode(&stored.hash) else {
        return false;
    };

    pbkdf2::verify(
        ALGORITHM,
        NonZeroU32::new(ITERATIONS).expect("nonzero iteration count"),
        &salt,
        password.as_bytes(),
        &expected,
    )
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_same_password_different_salts() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_verify_rejects_corrupt_hash() {
        let mut hash = hash_password("hunter2").unwrap();
        hash.hash = "not-hex".to_string();
        assert!(!verify_password("hunter2", &hash));
    }
}
