// Session token codec: HS256-signed JWT carrying SessionClaims, plus sliding renewal

use crate::core::crypto::{b64_decode, b64_encode, SigningKey};
use crate::core::errors::{CryptoError, GateError};
use crate::core::models::{SessionClaims, SubjectStatus, SubjectType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sliding expiration window applied on every authenticated request
pub const RENEWAL_WINDOW_MS: i64 = 30 * 60 * 1000;

const TOKEN_ALG: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default)]
    typ: String,
}

/// Wire payload: the claims plus the standard `sub` mirror of `subjectId`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    subject_id: String,
    subject_type: SubjectType,
    status: SubjectStatus,
    expires_in: i64,
}

impl From<&SessionClaims> for TokenPayload {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            sub: Some(claims.subject_id.clone()),
            subject_id: claims.subject_id.clone(),
            subject_type: claims.subject_type,
            status: claims.status,
            expires_in: claims.expires_at,
        }
    }
}

impl From<TokenPayload> for SessionClaims {
    fn from(payload: TokenPayload) -> Self {
        SessionClaims {
            subject_id: payload.subject_id,
            subject_type: payload.subject_type,
            status: payload.status,
            expires_at: payload.expires_in,
        }
    }
}

/// Issues and verifies session tokens
///
/// Format: `base64url(header).base64url(payload).base64url(hmac_sha256(header.payload))`.
/// The signing key is shared, immutable process-wide state.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: Arc<SigningKey>,
}

impl TokenCodec {
    pub fn new(key: Arc<SigningKey>) -> Self {
        Self { key }
    }

    /// Serialize and sign `claims`
    pub fn issue(&self, claims: &SessionClaims) -> Result<String, GateError> {
        let header = TokenHeader {
            alg: TOKEN_ALG.to_string(),
            typ: "JWT".to_string(),
        };

        let header_b64 = b64_encode(
            serde_json::to_string(&header)
                .map_err(|e| CryptoError::SigningError(format!("Failed to serialize header: {}", e)))?
                .as_bytes(),
        );
        let payload_b64 = b64_encode(
            serde_json::to_string(&TokenPayload::from(claims))
                .map_err(|e| CryptoError::SigningError(format!("Failed to serialize claims: {}", e)))?
                .as_bytes(),
        );

        let message = format!("{}.{}", header_b64, payload_b64);
        let signature = self.key.sign(message.as_bytes())?;

        Ok(format!("{}.{}", message, b64_encode(&signature)))
    }

    /// Check the signature and return the embedded claims unchanged
    ///
    /// Does not compare `expires_at` with the current time.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, GateError> {
        let mut segments = token.split('.');
        let (header_b64, payload_b64, signature_b64) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(GateError::InvalidToken),
            };

        let signature = b64_decode(signature_b64).ok_or(GateError::InvalidToken)?;
        let signed_len = header_b64.len() + 1 + payload_b64.len();
        if !self.key.verify(token[..signed_len].as_bytes(), &signature) {
            return Err(GateError::InvalidToken);
        }

        let header: TokenHeader = decode_segment(header_b64)?;
        if header.alg != TOKEN_ALG {
            return Err(GateError::InvalidToken);
        }

        let payload: TokenPayload = decode_segment(payload_b64)?;
        Ok(payload.into())
    }

    /// Apply the sliding-expiration policy to verified claims
    ///
    /// Returns `None` for non-expiring credentials, otherwise the renewed
    /// claims (expiry set to `now_ms + 30 min`) and their freshly issued token.
    pub fn renew(
        &self,
        claims: &SessionClaims,
        now_ms: i64,
    ) -> Result<Option<(SessionClaims, String)>, GateError> {
        if claims.is_non_expiring() {
            return Ok(None);
        }
        let renewed = SessionClaims {
            expires_at: now_ms + RENEWAL_WINDOW_MS,
            ..claims.clone()
        };
        let token = self.issue(&renewed)?;
        Ok(Some((renewed, token)))
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, GateError> {
    let bytes = b64_decode(segment).ok_or(GateError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| GateError::InvalidToken)
}
