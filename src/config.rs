// Configuration management

use crate::core::crypto::{CipherKey, SigningKey};
use crate::core::errors::GateError;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

/// Application configuration loaded from environment variables
///
/// Key material is decoded and validated here, once, and shared read-only
/// with the token codec and API key cipher for the life of the process.
#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub bind_address: String,
    pub port: u16,

    // Key material
    pub token_signing_key: Arc<SigningKey>,
    pub api_key_secret: Arc<CipherKey>,

    // Service identity
    pub api_version: String,
    pub build_tag_path: PathBuf,

    // Middleware configuration
    pub request_timeout_secs: u64,
    pub body_size_limit_bytes: usize,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    /// Missing or weak key material is an error; there is no fallback key.
    pub fn from_env() -> Result<Self, GateError> {
        // Skip in test environment to avoid interfering with test environment variables
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok();
        }

        let config = Self {
            bind_address: Self::get_env_or_default("BIND_ADDRESS", "0.0.0.0")?,
            port: Self::parse_port()?,
            token_signing_key: Arc::new(Self::load_signing_key("TOKEN_SIGNING_KEY")?),
            api_key_secret: Arc::new(Self::load_cipher_key("API_KEY_SECRET")?),
            api_version: Self::get_env_or_default("API_VERSION", env!("CARGO_PKG_VERSION"))?,
            build_tag_path: PathBuf::from(Self::get_env_or_default("BUILD_TAG_PATH", "build-tag")?),
            request_timeout_secs: Self::parse_u64_or_default("REQUEST_TIMEOUT_SECS", 30)?,
            body_size_limit_bytes: Self::parse_usize_or_default("BODY_SIZE_LIMIT_BYTES", 2 * 1024 * 1024)?,
            log_level: Self::get_env_or_default("LOG_LEVEL", "info")?,
            log_format: Self::get_env_or_default("LOG_FORMAT", "json")?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Get environment variable or return default value
    fn get_env_or_default(key: &str, default: &str) -> Result<String, GateError> {
        Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
    }

    fn get_required_env(key: &str) -> Result<String, GateError> {
        let value = env::var(key)
            .map_err(|_| GateError::ConfigurationError(format!("{} not set", key)))?;

        if value.trim().is_empty() {
            return Err(GateError::ConfigurationError(format!("{} is empty", key)));
        }

        Ok(value)
    }

    fn load_signing_key(key: &str) -> Result<SigningKey, GateError> {
        let value = Self::get_required_env(key)?;
        SigningKey::from_hex(&value)
            .map_err(|e| GateError::ConfigurationError(format!("{}: {}", key, e)))
    }

    fn load_cipher_key(key: &str) -> Result<CipherKey, GateError> {
        let value = Self::get_required_env(key)?;
        CipherKey::from_hex(&value)
            .map_err(|e| GateError::ConfigurationError(format!("{}: {}", key, e)))
    }

    /// Parse port from PORT environment variable
    fn parse_port() -> Result<u16, GateError> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let port = port_str.parse::<u16>().map_err(|e| {
            GateError::ConfigurationError(format!("Invalid PORT value '{}': {}", port_str, e))
        })?;

        if port == 0 {
            return Err(GateError::ConfigurationError(
                "PORT must be between 1 and 65535".to_string(),
            ));
        }

        Ok(port)
    }

    fn parse_u64_or_default(key: &str, default: u64) -> Result<u64, GateError> {
        match env::var(key) {
            Ok(value) => Self::parse_positive(key, &value),
            _ => Ok(default),
        }
    }

    fn parse_usize_or_default(key: &str, default: usize) -> Result<usize, GateError> {
        match env::var(key) {
            Ok(value) => Self::parse_positive(key, &value),
            _ => Ok(default),
        }
    }

    /// Parse a strictly positive number
    fn parse_positive<T>(key: &str, value: &str) -> Result<T, GateError>
    where
        T: std::str::FromStr + PartialEq + Default,
        T::Err: std::fmt::Display,
    {
        let parsed = value.trim().parse::<T>().map_err(|e| {
            GateError::ConfigurationError(format!("Invalid {} value '{}': {}", key, value, e))
        })?;

        if parsed == T::default() {
            return Err(GateError::ConfigurationError(format!(
                "{} must be greater than 0",
                key
            )));
        }

        Ok(parsed)
    }

    /// Validate all configuration values
    fn validate(&self) -> Result<(), GateError> {
        if self.api_version.trim().is_empty() {
            return Err(GateError::ConfigurationError(
                "API_VERSION must not be empty".to_string(),
            ));
        }
        Self::validate_log_level(&self.log_level)?;
        Self::validate_log_format(&self.log_format)?;
        Ok(())
    }

    fn validate_log_level(level: &str) -> Result<(), GateError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level.to_lowercase().as_str()) {
            return Err(GateError::ConfigurationError(format!(
                "Invalid LOG_LEVEL '{}': must be one of {}",
                level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_log_format(format: &str) -> Result<(), GateError> {
        if format != "json" && format != "text" {
            return Err(GateError::ConfigurationError(format!(
                "Invalid LOG_FORMAT '{}': must be 'json' or 'text'",
                format
            )));
        }
        Ok(())
    }

    /// Version reported by `GET /`: first line of the build tag file, else `api_version`
    pub fn reported_version(&self) -> String {
        std::fs::read_to_string(&self.build_tag_path)
            .ok()
            .and_then(|content| content.lines().next().map(|l| l.trim().to_string()))
            .filter(|line| !line.is_empty())
            .unwrap_or_else(|| self.api_version.clone())
    }
}

impl Config {
    /// Create a test configuration
    ///
    /// Uses fixed, non-zero keys and bypasses environment variable loading.
    /// Shared with the integration tests; never called by the service itself.
    #[doc(hidden)]
    pub fn test_config() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            token_signing_key: Arc::new(
                SigningKey::from_bytes((1..=32).collect()).unwrap_or_else(|e| panic!("{}", e)),
            ),
            api_key_secret: Arc::new(
                CipherKey::from_bytes(&[0x5a; 32]).unwrap_or_else(|e| panic!("{}", e)),
            ),
            api_version: "test-1.0.0".to_string(),
            build_tag_path: PathBuf::from("/nonexistent/build-tag"),
            request_timeout_secs: 30,
            body_size_limit_bytes: 2 * 1024 * 1024,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}
