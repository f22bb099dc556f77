// Key material and cryptographic primitives shared by the token codec and API key cipher

use crate::core::errors::CryptoError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, Secret, SecretVec};
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Minimum HMAC signing key length in bytes
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// AES-256 key length in bytes
pub const CIPHER_KEY_LEN: usize = 32;

/// HMAC-SHA256 signing key for session tokens
pub struct SigningKey(SecretVec<u8>);

impl SigningKey {
    /// Build from raw bytes
    ///
    /// Rejects keys shorter than 32 bytes and all-zero keys.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(bytes);
        if bytes.len() < MIN_SIGNING_KEY_LEN {
            return Err(CryptoError::KeyLoadError(format!(
                "signing key too short: expected at least {} bytes, got {}",
                MIN_SIGNING_KEY_LEN,
                bytes.len()
            )));
        }
        if bytes.iter().all(|b| *b == 0) {
            return Err(CryptoError::KeyLoadError("signing key is all zero".to_string()));
        }
        Ok(Self(Secret::new(bytes.to_vec())))
    }

    /// Build from a hex string
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| CryptoError::KeyLoadError(format!("signing key is not valid hex: {}", e)))?;
        Self::from_bytes(bytes)
    }

    /// Generate a fresh random key
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = vec![0u8; MIN_SIGNING_KEY_LEN];
        fill_random(&mut bytes)?;
        Self::from_bytes(bytes)
    }

    /// HMAC-SHA256 over `message`
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut mac = HmacSha256::new_from_slice(self.0.expose_secret())
            .map_err(|e| CryptoError::SigningError(e.to_string()))?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Constant-time check of `signature` against HMAC-SHA256 over `message`
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let mut mac = match HmacSha256::new_from_slice(self.0.expose_secret()) {
            Ok(m) => m,
            Err(_) => return false,
        };
        mac.update(message);
        mac.verify_slice(signature).is_ok()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").field("key", &"<REDACTED>").finish()
    }
}

/// AES-256 secret for API key encryption
pub struct CipherKey(Secret<[u8; CIPHER_KEY_LEN]>);

impl CipherKey {
    /// Build from raw bytes; exactly 32 bytes, not all zero
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != CIPHER_KEY_LEN {
            return Err(CryptoError::KeyLoadError(format!(
                "cipher key must be {} bytes, got {}",
                CIPHER_KEY_LEN,
                bytes.len()
            )));
        }
        if bytes.iter().all(|b| *b == 0) {
            return Err(CryptoError::KeyLoadError("cipher key is all zero".to_string()));
        }
        let mut key = [0u8; CIPHER_KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(Secret::new(key)))
    }

    /// Build from a hex string
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            hex::decode(hex_str.trim())
                .map_err(|e| CryptoError::KeyLoadError(format!("cipher key is not valid hex: {}", e)))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Generate a fresh random key
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = Zeroizing::new([0u8; CIPHER_KEY_LEN]);
        fill_random(&mut bytes[..])?;
        Self::from_bytes(&bytes[..])
    }

    pub(crate) fn expose(&self) -> &[u8; CIPHER_KEY_LEN] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherKey").field("key", &"<REDACTED>").finish()
    }
}

/// Fill `buf` from the operating system CSPRNG
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    OsRng.try_fill_bytes(buf).map_err(|_| CryptoError::RandomError)
}

/// base64url without padding
pub fn b64_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Inverse of [`b64_encode`]; `None` on invalid input
pub fn b64_decode(segment: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(segment).ok()
}
