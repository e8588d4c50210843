//! Convenience re-exports for common CacheHaus usage
//!
//! # Example
//!
//! ```rust
//! use cachehaus::prelude::*;
//!
//! // Cache, RedisCache, the topology configs and errors are now in scope
//! ```

// Core CacheHaus components
pub use crate::core::{CacheHaus, init};
pub use crate::errors::CacheHausError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, FailoverConfig, SingleConfig, TopologyConfig, TopologyKind};

// Re-export cache system
pub use cache_system::prelude::*;

// Common external dependencies
pub use async_trait;
pub use tokio;
