// src/crypto.rs
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Argon2 error: {0}")]
    Argon2Error(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("Key size error: {0}")]
    KeySizeError(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Generate a fresh KDF salt in the PHC b64 form that `derive_key`
/// accepts. Stored per user.
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).as_str().to_string()
}

// Derive the vault encryption key from a login password and the user's salt
pub fn derive_key(password: &str, salt_b64: &str) -> Result<Vec<u8>> {
    let kdf_memory_cost = 65536; // 64 MB
    let kdf_time_cost = 3;
    let kdf_parallelism = 4;

    let salt = SaltString::from_b64(salt_b64)
        .map_err(|_| CryptoError::InvalidFormat("Invalid salt format".into()))?;

    // Argon2id with explicit 32-byte output for AES-256
    let params = argon2::Params::new(kdf_memory_cost, kdf_time_cost, kdf_parallelism, Some(32))
        .map_err(|e| CryptoError::Argon2Error(e.to_string()))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CryptoError::Argon2Error(e.to_string()))?;

    let hash = password_hash
        .hash
        .ok_or_else(|| CryptoError::KeySizeError("Derived hash is empty".into()))?;

    let key = hash.as_bytes().to_vec();
    if key.len() != 32 {
        return Err(CryptoError::KeySizeError(format!(
            "Expected 32-byte key, got {}",
            key.len()
        )));
    }

    Ok(key)
}

// Hash a login password for storage (argon2id PHC string)
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CryptoError::Argon2Error(e.to_string()))?;

    Ok(hash.to_string())
}

// Verify a login password against a stored PHC hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// Encrypt a secret with AES-GCM
pub fn encrypt_secret(key: &[u8], plaintext: &str) -> Result<Vec<u8>> {
    let aes_key = Key::<Aes256Gcm>::from_slice(key);
    let cipher = Aes256Gcm::new(aes_key);

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let nonce_bytes = nonce.to_vec();

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| CryptoError::EncryptionError(e.to_string()))?;

    // Nonce is stored in front of the ciphertext
    let mut encrypted = nonce_bytes;
    encrypted.extend_from_slice(&ciphertext);

    Ok(encrypted)
}

// Decrypt a secret produced by encrypt_secret
pub fn decrypt_secret(key: &[u8], ciphertext: &[u8]) -> Result<String> {
    if ciphertext.len() <= 12 {
        return Err(CryptoError::InvalidFormat("Ciphertext too short".into()));
    }

    let (nonce_bytes, encrypted_data) = ciphertext.split_at(12);

    let aes_key = Key::<Aes256Gcm>::from_slice(key);
    let cipher = Aes256Gcm::new(aes_key);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, encrypted_data)
        .map_err(|e| CryptoError::DecryptionError(e.to_string()))?;

    Ok(String::from_utf8(plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_roundtrips() {
        let key = [7u8; 32];
        let encrypted = encrypt_secret(&key, "hunter2!").unwrap();
        assert_eq!(decrypt_secret(&key, &encrypted).unwrap(), "hunter2!");
    }

    #[test]
    fn nonce_makes_ciphertexts_differ() {
        let key = [7u8; 32];
        let a = encrypt_secret(&key, "same input").unwrap();
        let b = encrypt_secret(&key, "same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let encrypted = encrypt_secret(&[7u8; 32], "secret").unwrap();
        assert!(decrypt_secret(&[8u8; 32], &encrypted).is_err());
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let err = decrypt_secret(&[7u8; 32], &[0u8; 12]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidFormat(_)));
    }

    #[test]
    fn derived_key_is_stable_per_salt() {
        let salt = generate_salt();
        let a = derive_key("correct horse", &salt).unwrap();
        let b = derive_key("correct horse", &salt).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);

        let other = derive_key("correct horse", &generate_salt()).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("tr0ub4dor&3").unwrap();
        assert!(verify_password("tr0ub4dor&3", &hash));
        assert!(!verify_password("troubador&3", &hash));
        assert!(!verify_password("tr0ub4dor&3", "not-a-phc-string"));
    }
}
