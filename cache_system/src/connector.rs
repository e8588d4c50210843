//! Redis client construction per topology
//!
//! Building a connector performs no network I/O. Connections are opened on
//! demand through [`Connector::connect`].

use crate::errors::CacheError;
use config::{FailoverConfig, SingleConfig, TopologyConfig};
use redis::aio::{ConnectionLike, ConnectionManager, MultiplexedConnection};
use redis::sentinel::{SentinelClient, SentinelNodeConnectionInfo, SentinelServerType};
use redis::{
    Client, Cmd, ConnectionAddr, ConnectionInfo, IntoConnectionInfo, Pipeline, RedisFuture,
    RedisResult, Value,
};
use std::fmt::Debug;
use tokio::sync::Mutex;

const DEFAULT_SENTINEL_PORT: u16 = 26379;

/// Source of new connections for one topology
pub(crate) enum Connector {
    Single(Client),
    /// Every connect asks the sentinels for the current master
    Failover(Mutex<SentinelClient>),
}

/// A connection held by a pool slot
#[derive(Clone)]
pub(crate) enum PooledConnection {
    /// Reconnects on its own after I/O failures
    Managed(ConnectionManager),
    /// Bound to the master the sentinels reported at connect time
    Sentinel(MultiplexedConnection),
}

impl Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connector::Single(client) => f
                .debug_tuple("Single")
                .field(&client.get_connection_info().addr)
                .finish(),
            Connector::Failover(_) => f.debug_tuple("Failover").finish(),
        }
    }
}

impl Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PooledConnection::Managed(_) => f.write_str("Managed"),
            PooledConnection::Sentinel(_) => f.write_str("Sentinel"),
        }
    }
}

impl Connector {
    pub(crate) fn new(topology: &TopologyConfig) -> Result<Self, CacheError> {
        match topology {
            TopologyConfig::Single(config) => Self::single(config),
            TopologyConfig::Failover(config) => Self::failover(config),
        }
    }

    fn single(config: &SingleConfig) -> Result<Self, CacheError> {
        let mut info = connection_info(&config.endpoint, None)?;
        info.redis.db = config.database;
        if let Some(password) = password(&config.password) {
            info.redis.password = Some(password);
        }

        Ok(Connector::Single(Client::open(info)?))
    }

    fn failover(config: &FailoverConfig) -> Result<Self, CacheError> {
        let sentinels = config
            .sentinel_endpoints
            .iter()
            .map(|endpoint| connection_info(endpoint, Some(DEFAULT_SENTINEL_PORT)))
            .collect::<Result<Vec<_>, CacheError>>()?;

        // Credentials and database apply to the master, not to the sentinels
        let mut node_info = redis::RedisConnectionInfo::default();
        node_info.db = config.database;
        node_info.password = password(&config.password);
        let node = SentinelNodeConnectionInfo {
            redis_connection_info: Some(node_info),
            ..Default::default()
        };

        let client = SentinelClient::build(
            sentinels,
            config.master_name.clone(),
            Some(node),
            SentinelServerType::Master,
        )?;

        Ok(Connector::Failover(Mutex::new(client)))
    }

    /// Open a new connection
    pub(crate) async fn connect(&self) -> RedisResult<PooledConnection> {
        match self {
            Connector::Single(client) => ConnectionManager::new(client.clone())
                .await
                .map(PooledConnection::Managed),
            Connector::Failover(sentinel) => sentinel
                .lock()
                .await
                .get_async_connection()
                .await
                .map(PooledConnection::Sentinel),
        }
    }
}

impl PooledConnection {
    /// Whether a failed command means this connection should be replaced.
    ///
    /// A demoted master answers writes with READONLY and stays reachable, so
    /// that is treated like a broken link for both topologies. Transport
    /// errors only matter for sentinel connections; the manager handles its own.
    pub(crate) fn needs_reconnect(&self, err: &redis::RedisError) -> bool {
        if matches!(
            err.kind(),
            redis::ErrorKind::ReadOnly | redis::ErrorKind::MasterDown
        ) {
            return true;
        }
        match self {
            PooledConnection::Managed(_) => false,
            PooledConnection::Sentinel(_) => {
                err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal()
            }
        }
    }
}

impl ConnectionLike for PooledConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        match self {
            PooledConnection::Managed(conn) => conn.req_packed_command(cmd),
            PooledConnection::Sentinel(conn) => conn.req_packed_command(cmd),
        }
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        match self {
            PooledConnection::Managed(conn) => conn.req_packed_commands(cmd, offset, count),
            PooledConnection::Sentinel(conn) => conn.req_packed_commands(cmd, offset, count),
        }
    }

    fn get_db(&self) -> i64 {
        match self {
            PooledConnection::Managed(conn) => conn.get_db(),
            PooledConnection::Sentinel(conn) => conn.get_db(),
        }
    }
}

fn password(password: &str) -> Option<String> {
    (!password.is_empty()).then(|| password.to_string())
}

/// Parse an endpoint with the redis URL rules.
///
/// Bare `host[:port]` addresses get the `redis://` scheme. When `default_port`
/// is given it replaces the scheme default for addresses written without a port.
fn connection_info(
    endpoint: &str,
    default_port: Option<u16>,
) -> Result<ConnectionInfo, CacheError> {
    let endpoint = endpoint.trim();
    let invalid = || CacheError::InvalidAddress(endpoint.to_string());

    if endpoint.contains("://") {
        return endpoint.into_connection_info().map_err(|_| invalid());
    }

    let mut info = format!("redis://{}", endpoint)
        .into_connection_info()
        .map_err(|_| invalid())?;

    if let ConnectionAddr::Tcp(host, port) = &mut info.addr {
        if host.is_empty() {
            return Err(invalid());
        }
        if let Some(default_port) = default_port {
            if !endpoint.ends_with(&format!(":{}", port)) {
                *port = default_port;
            }
        }
    }

    Ok(info)
}
