//! Credential encryption for stored external database passwords.
//!
//! Passwords are sealed with AES-256-GCM under a key derived from the
//! application secret with PBKDF2-HMAC-SHA256. Every ciphertext carries its
//! own random salt and nonce.
//!
//! Format: `pbkdf2-aes256gcm$<iterations>$base64(salt_16 || nonce_12 || ciphertext || tag_16)`

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use thiserror::Error;

const SCHEME: &str = "pbkdf2-aes256gcm";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Iteration count used for newly sealed values.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Bounds accepted when opening a sealed value.
const MIN_ITERATIONS: u32 = 1_000;
const MAX_ITERATIONS: u32 = 10_000_000;

/// Error type for credential encryption.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Credential secret must not be empty")]
    EmptySecret,

    #[error("Encrypted value has an unknown format")]
    InvalidFormat,

    #[error("Encrypted value is not valid base64")]
    InvalidEncoding,

    #[error("Encrypted value is too short")]
    TooShort,

    #[error("Iteration count {0} is out of range")]
    InvalidIterations(u32),

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed (wrong secret or tampered data)")]
    DecryptionFailed,

    #[error("Decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

/// Seals and opens database passwords with the application credential secret.
#[derive(Clone)]
pub struct CredentialCipher {
    secret: Vec<u8>,
    iterations: u32,
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("secret", &"[REDACTED]")
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl CredentialCipher {
    /// Creates a cipher using [`DEFAULT_ITERATIONS`].
    pub fn new(secret: &str) -> Result<Self, CryptoError> {
        Self::with_iterations(secret, DEFAULT_ITERATIONS)
    }

    /// Creates a cipher with an explicit PBKDF2 iteration count for new values.
    pub fn with_iterations(secret: &str, iterations: u32) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&iterations) {
            return Err(CryptoError::InvalidIterations(iterations));
        }
        Ok(Self {
            secret: secret.as_bytes().to_vec(),
            iterations,
        })
    }

    /// Encrypts a plaintext password into the sealed string format.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce_bytes);

        let cipher = self.cipher_for(&salt, self.iterations)?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut payload = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&salt);
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);

        Ok(format!(
            "{}${}${}",
            SCHEME,
            self.iterations,
            STANDARD.encode(payload)
        ))
    }

    /// Decrypts a sealed value back into the plaintext password.
    pub fn decrypt(&self, sealed: &str) -> Result<String, CryptoError> {
        let mut parts = sealed.splitn(3, '$');
        let scheme = parts.next().ok_or(CryptoError::InvalidFormat)?;
        let iterations = parts.next().ok_or(CryptoError::InvalidFormat)?;
        let encoded = parts.next().ok_or(CryptoError::InvalidFormat)?;

        if scheme != SCHEME {
            return Err(CryptoError::InvalidFormat);
        }
        let iterations: u32 = iterations.parse().map_err(|_| CryptoError::InvalidFormat)?;
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&iterations) {
            return Err(CryptoError::InvalidIterations(iterations));
        }

        let data = STANDARD
            .decode(encoded)
            .map_err(|_| CryptoError::InvalidEncoding)?;
        if data.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
            return Err(CryptoError::TooShort);
        }

        let (salt, rest) = data.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let cipher = self.cipher_for(salt, iterations)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Returns true if the value looks like something produced by [`encrypt`](Self::encrypt).
    pub fn is_sealed(value: &str) -> bool {
        value.starts_with(SCHEME) && value.matches('$').count() == 2
    }

    fn cipher_for(&self, salt: &[u8], iterations: u32) -> Result<Aes256Gcm, CryptoError> {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(&self.secret, salt, iterations, &mut key);
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::EncryptionFailed);
        key.fill(0);
        cipher
    }
}

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
