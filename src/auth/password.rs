/// Password Hashing and Verification
///
/// Salted bcrypt with a fixed work factor. The comparison inside
/// `bcrypt::verify` is constant-time.

use bcrypt::{hash, verify};

use crate::error::CryptoError;

/// bcrypt work factor for every stored password.
pub const HASH_COST: u32 = 10;

/// Hash a password using bcrypt
///
/// Any input is accepted, including the empty string.
///
/// # Errors
/// Returns `CryptoError::Hashing` if bcrypt itself fails
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    hash(password, HASH_COST).map_err(|e| CryptoError::Hashing(e.to_string()))
}

/// Verify a password against its hash
///
/// A mismatch is `Ok(false)`; only a malformed digest is an error.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, CryptoError> {
    verify(password, hashed).map_err(|e| CryptoError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "hunter2";
        let hashed = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hashed);
        assert!(hashed.starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let hashed = hash_password("hunter2").expect("Failed to hash password");

        let is_valid = verify_password("hunter2", &hashed).expect("Failed to verify password");
        assert!(is_valid);
    }

    #[test]
    fn test_verify_wrong_password() {
        let hashed = hash_password("hunter2").expect("Failed to hash password");

        let is_valid = verify_password("hunter3", &hashed).expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("password").unwrap();
        let second = hash_password("password").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("password", &first).unwrap());
        assert!(verify_password("password", &second).unwrap());
    }

    #[test]
    fn test_empty_password_is_accepted() {
        let hashed = hash_password("").expect("Empty password should hash");

        assert!(verify_password("", &hashed).unwrap());
        assert!(!verify_password("x", &hashed).unwrap());
    }

    #[test]
    fn test_malformed_digest_is_an_error() {
        assert!(matches!(
            verify_password("hunter2", "not-a-bcrypt-hash"),
            Err(CryptoError::Hashing(_))
        ));
    }
}
