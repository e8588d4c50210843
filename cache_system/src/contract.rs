//! The cache contract every backend implements

use crate::errors::CacheError;
use async_trait::async_trait;

/// Byte-oriented key-value cache
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get the value stored under `key`.
    ///
    /// An absent key is reported as [`CacheError::KeyNotFound`].
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, CacheError>;

    /// Store `value` under `key` with no expiration
    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), CacheError>;

    /// Remove `key`. Removing a key that does not exist succeeds.
    async fn delete(&self, key: &[u8]) -> Result<(), CacheError>;
}
