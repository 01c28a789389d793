//! Password value object and secret generation.
//!
//! Argon2 hashing lives here together with the generators for
//! temporary passwords and activation tokens, all drawing from the OS RNG.

use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};

use crate::config::{MIN_PASSWORD_LENGTH, TEMP_PASSWORD_ALPHABET, TEMP_PASSWORD_LENGTH};
use crate::errors::{AppError, AppResult};

/// URL-safe alphabet used for activation tokens (64 symbols)
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Activation tokens carry 43 symbols (~258 bits)
const TOKEN_LENGTH: usize = 43;

/// Password value object that handles hashing and verification.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Create a new password by hashing the plain text.
    ///
    /// # Errors
    /// Returns validation error if password is too short.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        if plain_text.len() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let hash = Self::hash(plain_text)?;
        Ok(Self { hash })
    }

    /// Create a Password from an existing hash (from database).
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    pub fn verify(&self, plain_text: &str) -> bool {
        Self::verify_hash(plain_text, &self.hash).unwrap_or(false)
    }

    fn hash(plain_text: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_hash(plain_text: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;
        Ok(Self::argon2()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok())
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Password {}

/// Generate a temporary alphanumeric password for newly provisioned accounts.
pub fn generate_temp_password() -> String {
    random_string(TEMP_PASSWORD_ALPHABET, TEMP_PASSWORD_LENGTH)
}

/// Generate a URL-safe activation token.
pub fn generate_token() -> String {
    random_string(TOKEN_ALPHABET, TOKEN_LENGTH)
}

/// Uniformly sample `len` symbols from `alphabet` using rejection sampling.
fn random_string(alphabet: &[u8], len: usize) -> String {
    // Largest multiple of the alphabet size that fits in a byte
    let limit = (256 / alphabet.len()) * alphabet.len();
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];

    while out.len() < len {
        OsRng.fill_bytes(&mut buf);
        for byte in buf.iter().map(|b| *b as usize) {
            if byte < limit {
                out.push(alphabet[byte % alphabet.len()] as char);
                if out.len() == len {
                    break;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let plain = "SecurePassword123!";
        let password = Password::new(plain).unwrap();

        assert!(password.verify(plain));
        assert!(!password.verify("WrongPassword123"));
    }

    #[test]
    fn test_password_from_hash() {
        let plain = "TestPassword123";
        let password = Password::new(plain).unwrap();
        let restored = Password::from_hash(password.as_str().to_string());
        assert!(restored.verify(plain));
    }

    #[test]
    fn test_password_too_short() {
        assert!(Password::new("short").is_err());
        assert!(Password::new("12345678").is_ok());
    }

    #[test]
    fn test_temp_password_shape() {
        let temp = generate_temp_password();
        assert_eq!(temp.len(), 12);
        assert!(temp.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(temp, generate_temp_password());
    }

    #[test]
    fn test_temp_password_is_hashable() {
        let temp = generate_temp_password();
        let hashed = Password::new(&temp).unwrap();
        assert!(hashed.verify(&temp));
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = generate_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, generate_token());
    }
}
