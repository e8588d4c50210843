//! Cache system for Redis-based caching
//!
//! This crate defines the [`Cache`] contract and [`RedisCache`], its Redis
//! implementation for single-endpoint and sentinel failover deployments.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

mod connector;
pub mod contract;
pub mod errors;
#[cfg(test)]
mod fake_server;
mod pool;
pub mod prelude;
pub mod redis_cache;
mod ttl;

// Re-export centralized config
pub use config::{FailoverConfig, SingleConfig, TopologyConfig, TopologyKind};

pub use contract::Cache;
pub use errors::CacheError;
pub use redis_cache::RedisCache;
