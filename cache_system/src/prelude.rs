//! Convenience re-exports for common cache-system usage

// Core cache system components
pub use crate::contract::Cache;
pub use crate::errors::CacheError;
pub use crate::redis_cache::RedisCache;

// Re-export centralized config
pub use config::{FailoverConfig, SingleConfig, TopologyConfig, TopologyKind};

// Common external dependencies
pub use async_trait::async_trait;
pub use chrono;
pub use redis;
pub use tokio;
