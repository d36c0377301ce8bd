//! Argon2id hashing for passwords and security answers.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("failed to hash password: {e}"))
}

pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| anyhow!("invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Security answers are compared trimmed and case-insensitively.
fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

pub fn hash_answer(answer: &str) -> anyhow::Result<String> {
    hash_password(&normalize_answer(answer))
}

/// An account without a stored answer can never pass.
pub fn verify_answer(answer: &str, hash: &str) -> anyhow::Result<bool> {
    if hash.is_empty() {
        return Ok(false);
    }
    verify_password(&normalize_answer(answer), hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct-horse-battery-staple").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse-battery-staple", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn answers_ignore_case_and_padding() {
        let hash = hash_answer("Mittens").unwrap();
        assert!(verify_answer("  mittens ", &hash).unwrap());
        assert!(!verify_answer("socks", &hash).unwrap());
    }

    #[test]
    fn missing_answer_never_verifies() {
        assert!(!verify_answer("", "").unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }
}
