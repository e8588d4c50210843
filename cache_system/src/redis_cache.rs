//! Redis cache adapter
//!
//! This module provides [`RedisCache`], the [`Cache`] implementation backed
//! by a Redis server or a sentinel-monitored failover group, together with
//! the Redis-specific expiry and existence operations.

use crate::connector::Connector;
use crate::contract::Cache;
use crate::errors::CacheError;
use crate::pool::{ConnectionPool, Lease};
use crate::ttl;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use config::{FailoverConfig, SingleConfig, TopologyConfig, TopologyKind};
use redis::{AsyncCommands, ExistenceCheck, RedisResult, SetExpiry, SetOptions};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Redis-backed cache
///
/// The topology is fixed at construction. Clones share the same connections.
#[derive(Clone)]
pub struct RedisCache {
    topology: Arc<TopologyConfig>,
    pool: Arc<ConnectionPool>,
}

impl Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("topology", &self.topology)
            .field("slots", &self.pool.size())
            .field("connected", &self.pool.open_connections())
            .finish()
    }
}

impl RedisCache {
    /// Create a cache bound to the given topology.
    ///
    /// No connection is opened until the first command.
    pub fn new(topology: TopologyConfig) -> Result<Self, CacheError> {
        topology.validate()?;

        let connector = Connector::new(&topology)?;
        let pool = ConnectionPool::new(connector, topology.pool_size());

        match &topology {
            TopologyConfig::Single(config) => tracing::debug!(
                "[CACHE] Using endpoint {} (db {}, {} slots)",
                config.endpoint,
                config.database,
                pool.size()
            ),
            TopologyConfig::Failover(config) => tracing::debug!(
                "[CACHE] Using master '{}' via sentinels {:?} (db {}, {} slots)",
                config.master_name,
                config.sentinel_endpoints,
                config.database,
                pool.size()
            ),
        }

        Ok(Self {
            topology: Arc::new(topology),
            pool: Arc::new(pool),
        })
    }

    /// Create a cache from two optional topologies; failover wins when both are given
    pub fn from_options(
        single: Option<SingleConfig>,
        failover: Option<FailoverConfig>,
    ) -> Result<Self, CacheError> {
        Self::new(TopologyConfig::from_options(single, failover)?)
    }

    /// The topology this cache was built with
    pub fn topology(&self) -> &TopologyConfig {
        &self.topology
    }

    pub fn topology_kind(&self) -> TopologyKind {
        self.topology.kind()
    }

    /// Finish a command run on `lease`.
    ///
    /// Errors are returned as-is. When the error shows the connection can no
    /// longer serve writes, its slot is cleared so the next call reconnects.
    async fn settle<T: Send>(&self, lease: Lease, result: RedisResult<T>) -> Result<T, CacheError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                if lease.connection.needs_reconnect(&err) {
                    tracing::warn!("[CACHE] Dropping connection in slot {}: {}", lease.slot, err);
                    self.pool.discard(lease.slot, lease.generation).await;
                }
                Err(err.into())
            }
        }
    }

    /// Check whether `key` exists
    pub async fn exists(&self, key: &[u8]) -> Result<bool, CacheError> {
        crate::trace_log!("[CACHE] EXISTS ({} byte key)", key.len());
        let mut lease = self.pool.acquire().await?;
        let result: RedisResult<bool> = lease.connection.exists(key).await;
        self.settle(lease, result).await
    }

    /// Store `value` only if `key` is absent.
    ///
    /// Returns `false` when the key already existed. A zero `ttl` stores the
    /// value without expiration.
    pub async fn set_nx(&self, key: &[u8], value: &[u8], ttl: Duration) -> Result<bool, CacheError> {
        crate::trace_log!("[CACHE] SET NX ({} byte key, ttl {:?})", key.len(), ttl);
        let mut options = SetOptions::default().conditional_set(ExistenceCheck::NX);
        let millis = ttl::duration_millis(ttl);
        if millis > 0 {
            options = options.with_expiration(SetExpiry::PX(millis));
        }

        let mut lease = self.pool.acquire().await?;
        let result: RedisResult<Option<String>> =
            lease.connection.set_options(key, value, options).await;
        let reply = self.settle(lease, result).await?;
        Ok(reply.is_some())
    }

    /// Set the remaining lifetime of `key`; `false` when the key does not exist
    pub async fn expire(&self, key: &[u8], ttl: Duration) -> Result<bool, CacheError> {
        crate::trace_log!("[CACHE] PEXPIRE ({} byte key, ttl {:?})", key.len(), ttl);
        let millis = i64::try_from(ttl::duration_millis(ttl)).unwrap_or(i64::MAX);

        let mut lease = self.pool.acquire().await?;
        let result: RedisResult<bool> = lease.connection.pexpire(key, millis).await;
        self.settle(lease, result).await
    }

    /// Expire `key` at an absolute instant; `false` when the key does not exist
    pub async fn expire_at(&self, key: &[u8], at: DateTime<Utc>) -> Result<bool, CacheError> {
        crate::trace_log!("[CACHE] PEXPIREAT ({} byte key, at {})", key.len(), at);
        let mut lease = self.pool.acquire().await?;
        let result: RedisResult<bool> = lease
            .connection
            .pexpire_at(key, ttl::instant_millis(at))
            .await;
        self.settle(lease, result).await
    }

    /// Ping Redis to check connectivity
    pub async fn ping(&self) -> Result<String, CacheError> {
        let mut lease = self.pool.acquire().await?;
        let result: RedisResult<String> = redis::cmd("PING").query_async(&mut lease.connection).await;
        self.settle(lease, result).await
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, CacheError> {
        crate::trace_log!("[CACHE] GET ({} byte key)", key.len());
        let mut lease = self.pool.acquire().await?;
        let result: RedisResult<Option<Vec<u8>>> = lease.connection.get(key).await;
        self.settle(lease, result)
            .await?
            .ok_or_else(|| CacheError::key_not_found(key))
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), CacheError> {
        crate::trace_log!("[CACHE] SET ({} byte key, {} byte value)", key.len(), value.len());
        let mut lease = self.pool.acquire().await?;
        let result: RedisResult<()> = lease.connection.set(key, value).await;
        self.settle(lease, result).await
    }

    async fn delete(&self, key: &[u8]) -> Result<(), CacheError> {
        crate::trace_log!("[CACHE] DEL ({} byte key)", key.len());
        let mut lease = self.pool.acquire().await?;
        // Removing zero keys is not an error
        let result: RedisResult<i64> = lease.connection.del(key).await;
        self.settle(lease, result).await.map(|_removed| ())
    }
}
