// API key encryption and parsing

use crate::core::crypto::{fill_random, CipherKey};
use crate::core::errors::{CryptoError, GateError};
use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes256;
use std::sync::Arc;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// IV length: one AES block
pub const IV_LEN: usize = 16;

/// Encrypts application names into opaque API keys and back
///
/// Wire format is `hex(IV || AES-256-CTR(app_name))` with a fresh random IV
/// per key, so two keys for the same app never compare equal. There is no
/// integrity tag: a tampered key decrypts to garbage rather than failing.
#[derive(Debug, Clone)]
pub struct ApiKeyCipher {
    key: Arc<CipherKey>,
}

impl ApiKeyCipher {
    pub fn new(key: Arc<CipherKey>) -> Self {
        Self { key }
    }

    pub fn create_api_key(&self, app_name: &str) -> Result<String, GateError> {
        let mut iv = [0u8; IV_LEN];
        fill_random(&mut iv)?;

        let mut buf = Vec::with_capacity(IV_LEN + app_name.len());
        buf.extend_from_slice(&iv);
        buf.extend_from_slice(app_name.as_bytes());

        let mut cipher = Aes256Ctr::new_from_slices(self.key.expose(), &iv)
            .map_err(|e| CryptoError::EncryptionError(e.to_string()))?;
        cipher
            .try_apply_keystream(&mut buf[IV_LEN..])
            .map_err(|e| CryptoError::EncryptionError(e.to_string()))?;

        Ok(hex::encode(buf))
    }

    /// Recover the application name from an API key
    ///
    /// Fails with `InvalidApiKey` on non-hex input or input shorter than one
    /// IV. Decrypted bytes that are not UTF-8 are replaced lossily.
    pub fn parse_api_key(&self, api_key: &str) -> Result<String, GateError> {
        let mut bytes = hex::decode(api_key).map_err(|_| GateError::InvalidApiKey)?;
        if bytes.len() < IV_LEN {
            return Err(GateError::InvalidApiKey);
        }

        let (iv, body) = bytes.split_at_mut(IV_LEN);
        let mut cipher = Aes256Ctr::new_from_slices(self.key.expose(), iv)
            .map_err(|_| GateError::InvalidApiKey)?;
        cipher
            .try_apply_keystream(body)
            .map_err(|_| GateError::InvalidApiKey)?;

        Ok(String::from_utf8_lossy(body).into_owned())
    }
}
