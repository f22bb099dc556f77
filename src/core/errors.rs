// Domain error types - Secure error handling with no information disclosure

use thiserror::Error;

/// Main error type for the gate and audit core
#[derive(Error, Debug)]
pub enum GateError {
    /// Malformed or undecryptable API key (HTTP 403)
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Missing, malformed, or signature-mismatched session token (HTTP 401)
    #[error("Invalid access token")]
    InvalidToken,

    /// Caller lacks the required role (HTTP 403), decided by calling code
    #[error("Unauthorized")]
    Unauthorized,

    /// Body or structure failures (HTTP 400)
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Cryptographic error (HTTP 500)
    #[error("Cryptographic error: {0}")]
    CryptoError(#[from] CryptoError),

    /// Configuration error (HTTP 500)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Persistence sink error (HTTP 500)
    #[error("Store error: {0}")]
    StoreError(String),
}

/// Cryptographic operation errors
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key material missing, malformed, or unusable
    #[error("Failed to load key: {0}")]
    KeyLoadError(String),

    /// Failed to sign token
    #[error("Failed to sign token: {0}")]
    SigningError(String),

    /// Failed to encrypt API key
    #[error("Failed to encrypt: {0}")]
    EncryptionError(String),

    /// System random source unavailable
    #[error("Random source failure")]
    RandomError,
}

impl GateError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GateError::InvalidApiKey => 403,
            GateError::InvalidToken => 401,
            GateError::Unauthorized => 403,
            GateError::MalformedRequest(_) => 400,
            GateError::CryptoError(_) => 500,
            GateError::ConfigurationError(_) => 500,
            GateError::StoreError(_) => 500,
        }
    }

    /// Get user-friendly error message (no sensitive information)
    ///
    /// Key and token failures share one message so the body does not tell
    /// which check rejected the request; only the status code differs.
    pub fn user_message(&self) -> String {
        match self {
            GateError::InvalidApiKey | GateError::InvalidToken | GateError::Unauthorized => {
                "Access denied".to_string()
            }
            GateError::MalformedRequest(_) => "Malformed request".to_string(),
            GateError::CryptoError(_) => "Internal error".to_string(),
            GateError::ConfigurationError(_) => "Internal error".to_string(),
            GateError::StoreError(_) => "Internal error".to_string(),
        }
    }
}
