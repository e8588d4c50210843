//! Core CacheHaus functionality
//!
//! This module wires configuration to a ready-to-use [`RedisCache`].

use std::path::Path;
use std::sync::Arc;

use cache_system::{Cache, CacheError, RedisCache};
use config::{AppConfig, FailoverConfig, SingleConfig, TopologyConfig};

use crate::errors::CacheHausError;

/// Build a cache from two optional topologies.
///
/// The failover group takes precedence when both are supplied. Supplying
/// neither is a configuration error.
pub fn init(
    single: Option<SingleConfig>,
    failover: Option<FailoverConfig>,
) -> Result<RedisCache, CacheError> {
    RedisCache::from_options(single, failover)
}

/// Application entry point holding the process-wide cache
#[derive(Debug, Clone)]
pub struct CacheHaus {
    cache: RedisCache,
}

impl CacheHaus {
    /// Create CacheHaus for an explicit topology
    pub fn new(topology: TopologyConfig) -> Result<Self, CacheHausError> {
        Ok(Self {
            cache: RedisCache::new(topology)?,
        })
    }

    /// Load configuration from `CACHEHAUS_CONFIG` or `./cachehaus.toml`
    pub fn load() -> Result<Self, CacheHausError> {
        Self::from_config(&AppConfig::load()?)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CacheHausError> {
        Self::from_config(&AppConfig::from_file(path)?)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CacheHausError> {
        let topology = config.cache.topology()?;
        tracing::info!("CacheHaus starting with {} topology", topology.kind());
        Self::new(topology)
    }

    /// The Redis adapter, including its extended operations
    pub fn cache(&self) -> &RedisCache {
        &self.cache
    }

    /// A shared handle to the cache contract
    pub fn shared(&self) -> Arc<dyn Cache> {
        Arc::new(self.cache.clone())
    }

    /// Check Redis connectivity
    pub async fn health_check(&self) -> Result<(), CacheHausError> {
        self.cache.ping().await?;
        Ok(())
    }
}
