//! # Credentials and Reset Tokens
//!
//! Passwords are only ever stored as Argon2id PHC strings. Password reset
//! tokens leave the server once, inside the emailed link; the user record
//! keeps only their SHA-256 digest, matched in constant time.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::errors::{AuthError, AuthResult};

/// Shortest password accepted for an account
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Random bytes behind a reset token
const RESET_TOKEN_BYTES: usize = 20;

/// Password requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
        }
    }
}

impl PasswordPolicy {
    pub fn validate(&self, password: &str) -> AuthResult<()> {
        if password.chars().count() < self.min_length {
            return Err(AuthError::WeakPassword(format!(
                "Password must be at least {} characters",
                self.min_length
            )));
        }
        Ok(())
    }
}

/// Argon2id PHC string for `password`, with a fresh salt
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|_| AuthError::HashingFailed)
}

/// Whether `password` matches the stored PHC string.
/// A stored value that is not a PHC string counts as bad credentials.
pub fn verify_password(password: &str, stored: &str) -> AuthResult<bool> {
    let phc = PasswordHash::new(stored).map_err(|_| AuthError::InvalidCredentials)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &phc).is_ok())
}

/// A freshly issued password reset token
#[derive(Debug, Clone)]
pub struct ResetToken {
    /// Goes into the reset link, never into the store
    pub plain: String,
    /// Stored as `resetPasswordToken`
    pub digest: String,
}

impl ResetToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let plain = hex(&bytes);
        let digest = Self::digest_of(&plain);
        Self { plain, digest }
    }

    /// URL-safe base64 of the SHA-256 of `plain`
    pub fn digest_of(plain: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(plain.as_bytes()))
    }

    /// Constant-time check of a presented token against a stored digest
    pub fn matches(stored_digest: &str, presented: &str) -> bool {
        let presented = Self::digest_of(presented);
        stored_digest.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("123456").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("123456", &hash).unwrap());
        assert!(!verify_password("1234567", &hash).unwrap());
    }

    #[test]
    fn test_salted() {
        assert_ne!(hash_password("123456").unwrap(), hash_password("123456").unwrap());
    }

    #[test]
    fn test_stored_plaintext_is_invalid_credentials() {
        assert!(matches!(
            verify_password("123456", "123456"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_policy_min_length() {
        let policy = PasswordPolicy::default();
        assert!(matches!(policy.validate("12345"), Err(AuthError::WeakPassword(_))));
        assert!(policy.validate("123456").is_ok());
        assert!(PasswordPolicy { min_length: 10 }.validate("123456").is_err());
    }

    #[test]
    fn test_reset_token() {
        let token = ResetToken::generate();
        assert_eq!(token.plain.len(), RESET_TOKEN_BYTES * 2);
        assert!(token.plain.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token.plain, token.digest);
        assert_ne!(token.plain, ResetToken::generate().plain);

        assert!(ResetToken::matches(&token.digest, &token.plain));
        assert!(!ResetToken::matches(&token.digest, "0000"));
        assert!(!ResetToken::matches(&token.plain, &token.plain));
    }
}
