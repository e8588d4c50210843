//! Error types for cache operations
//!
//! Backend failures are carried unchanged in [`CacheError::Redis`] so callers
//! can inspect the original `redis::RedisError`.

use config::ConfigError;
use thiserror::Error;

/// Cache system errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid endpoint address: {0}")]
    InvalidAddress(String),
}

impl CacheError {
    /// Build a not-found error for a raw key
    pub(crate) fn key_not_found(key: &[u8]) -> Self {
        CacheError::KeyNotFound(String::from_utf8_lossy(key).into_owned())
    }

    /// True when a read found no value under the key
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::KeyNotFound(_))
    }

    /// The backend error, when this error came from the store
    pub fn as_redis(&self) -> Option<&redis::RedisError> {
        match self {
            CacheError::Redis(err) => Some(err),
            _ => None,
        }
    }
}
