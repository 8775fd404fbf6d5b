//! Per-connection framing settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading a [`ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Settings shared by every connection a server accepts.
///
/// Missing fields take their default values, so `{}` is a valid document.
///
/// # Examples
///
/// ```
/// use h1wire::config::ServerConfig;
///
/// let config = ServerConfig::from_json_str(r#"{ "strict_head": true }"#).unwrap();
/// assert!(config.strict_head);
/// assert_eq!(config.read_buffer_size, 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Capacity reserved before each socket read.
    pub read_buffer_size: usize,

    /// Largest head (request line plus headers) buffered while looking for
    /// the blank line. Exceeding it fails the request.
    pub max_head_size: usize,

    /// Largest number of header lines accepted in one head.
    pub max_headers: usize,

    /// Reject heads that `httparse` considers malformed instead of
    /// decomposing them best-effort.
    pub strict_head: bool,
}

/// Initial read buffer capacity per connection.
const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Maximum head size buffered before rejecting it (64 KiB).
const DEFAULT_MAX_HEAD_SIZE: usize = 64 * 1024;

/// Maximum number of header lines per head.
const DEFAULT_MAX_HEADERS: usize = 100;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_head_size: DEFAULT_MAX_HEAD_SIZE,
            max_headers: DEFAULT_MAX_HEADERS,
            strict_head: false,
        }
    }
}

impl ServerConfig {
    /// Parses a JSON document and validates it.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Json`]: the document is not valid JSON or has unknown fields.
    /// - [`ConfigError::Zero`]: a limit is zero.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Same as [`from_json_str`](Self::from_json_str) for raw bytes.
    pub fn from_json_slice(json: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every limit is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("read_buffer_size", self.read_buffer_size),
            ("max_head_size", self.max_head_size),
            ("max_headers", self.max_headers),
        ];
        match limits.into_iter().find(|&(_, value)| value == 0) {
            Some((field, _)) => Err(ConfigError::Zero { field }),
            None => Ok(()),
        }
    }
}
