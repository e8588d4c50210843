//! # CacheHaus
//!
//! A byte-oriented cache contract and its Redis adapter, for a single Redis
//! endpoint or a sentinel-monitored failover group.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cachehaus::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = cachehaus::init(
//!         None,
//!         Some(FailoverConfig::new("m1", vec!["s1:26379".to_string()])),
//!     )?;
//!
//!     cache.set(b"k", b"v").await?;
//!     assert_eq!(cache.get(b"k").await?, b"v".to_vec());
//!
//!     cache.set_nx(b"lock", b"owner", Duration::from_secs(30)).await?;
//!     cache.delete(b"k").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::{CacheHaus, init};
pub use errors::CacheHausError;

// Re-export centralized config
pub use config::{AppConfig, CacheSettings, FailoverConfig, SingleConfig, TopologyConfig, TopologyKind};

// Re-export internal crates used by the public API
pub use cache_system;
pub use config;

// Re-export external dependencies used in public API
pub use async_trait;
pub use chrono;
