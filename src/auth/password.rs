//! PBKDF2-HMAC-SHA256 password storage with a random per-user salt.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
const HASH_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;

/// Hash a password with a fresh random salt. Returns (hash, salt).
pub fn hash_password(password: &str) -> (Vec<u8>, Vec<u8>) {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = derive(password, &salt);
    (hash.to_vec(), salt.to_vec())
}

/// Verify a password against a stored hash and salt
pub fn verify_password(password: &str, salt: &[u8], expected_hash: &[u8]) -> bool {
    let computed = derive(password, salt);
    constant_time_eq(&computed, expected_hash)
}

fn derive(password: &str, salt: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut hash);
    hash
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let (hash, salt) = hash_password("hunter22");
        assert!(verify_password("hunter22", &salt, &hash));
    }

    #[test]
    fn wrong_password_fails() {
        let (hash, salt) = hash_password("hunter22");
        assert!(!verify_password("hunter23", &salt, &hash));
    }

    #[test]
    fn salts_are_unique_per_hash() {
        let (_, salt_a) = hash_password("same-password");
        let (_, salt_b) = hash_password("same-password");
        assert_ne!(salt_a, salt_b);
    }
}
