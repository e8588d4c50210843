//! # Configuration Management for CacheHaus
//!
//! This crate provides the topology configuration for the Redis cache adapter:
//! a single endpoint, or a sentinel-monitored failover group.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{FailoverConfig, SingleConfig, TopologyConfig};
//!
//! let single = TopologyConfig::Single(SingleConfig::new("localhost:6379"));
//!
//! let failover = TopologyConfig::Failover(FailoverConfig::new(
//!     "mymaster",
//!     vec!["10.0.0.1:26379".to_string(), "10.0.0.2:26379".to_string()],
//! ));
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [cache.single]
//! endpoint = "localhost:6379"
//! password = "secret"
//! database = 0
//! pool_size = 10
//!
//! [cache.failover]
//! master_name = "mymaster"
//! sentinel_endpoints = ["10.0.0.1:26379", "10.0.0.2:26379"]
//! password = "secret"
//! database = 0
//! pool_size = 10
//! ```
//!
//! Either table may be left out. When both are present the failover group wins.
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from cachehaus.toml
//! let config = AppConfig::load()?;
//! let topology = config.cache.topology()?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./cachehaus.toml";
const CONFIG_PATH_VAR: &str = "CACHEHAUS_CONFIG";
const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("No cache topology configured: expected a single endpoint or a failover group")]
    MissingTopology,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheSettings,
}

/// The two optional topology inputs as they appear in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<SingleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover: Option<FailoverConfig>,
}

/// Direct connection to one Redis endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleConfig {
    /// `host:port` of the Redis server
    pub endpoint: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: i64,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Sentinel-monitored failover group
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverConfig {
    /// Name the sentinels know the master by
    pub master_name: String,
    /// `host:port` of each sentinel, tried in order
    pub sentinel_endpoints: Vec<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: i64,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// The resolved topology a cache is built against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topology", rename_all = "snake_case")]
pub enum TopologyConfig {
    Single(SingleConfig),
    Failover(FailoverConfig),
}

/// Which arm of [`TopologyConfig`] is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyKind {
    Single,
    Failover,
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

impl AppConfig {
    /// Load configuration from the TOML file named in the environment, or the default path
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is not an error, the variable may be set directly
        let _ = dotenvy::dotenv();

        if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified in .env file as {} or in {} file",
                CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH
            )))
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate whichever topology tables are present
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(single) = &self.cache.single {
            single.validate()?;
        }
        if let Some(failover) = &self.cache.failover {
            failover.validate()?;
        }
        Ok(())
    }
}

impl CacheSettings {
    /// Resolve the configured tables into one topology
    pub fn topology(&self) -> Result<TopologyConfig, ConfigError> {
        TopologyConfig::from_options(self.single.clone(), self.failover.clone())
    }
}

impl TopologyConfig {
    /// Pick a topology from two optional inputs.
    ///
    /// A failover group takes precedence over a single endpoint when both are supplied.
    pub fn from_options(
        single: Option<SingleConfig>,
        failover: Option<FailoverConfig>,
    ) -> Result<Self, ConfigError> {
        match (failover, single) {
            (Some(failover), _) => Ok(TopologyConfig::Failover(failover)),
            (None, Some(single)) => Ok(TopologyConfig::Single(single)),
            (None, None) => Err(ConfigError::MissingTopology),
        }
    }

    pub fn kind(&self) -> TopologyKind {
        match self {
            TopologyConfig::Single(_) => TopologyKind::Single,
            TopologyConfig::Failover(_) => TopologyKind::Failover,
        }
    }

    pub fn password(&self) -> &str {
        match self {
            TopologyConfig::Single(config) => &config.password,
            TopologyConfig::Failover(config) => &config.password,
        }
    }

    pub fn database(&self) -> i64 {
        match self {
            TopologyConfig::Single(config) => config.database,
            TopologyConfig::Failover(config) => config.database,
        }
    }

    pub fn pool_size(&self) -> u32 {
        match self {
            TopologyConfig::Single(config) => config.pool_size,
            TopologyConfig::Failover(config) => config.pool_size,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            TopologyConfig::Single(config) => config.validate(),
            TopologyConfig::Failover(config) => config.validate(),
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyKind::Single => write!(f, "single"),
            TopologyKind::Failover => write!(f, "failover"),
        }
    }
}

impl SingleConfig {
    /// Create a single-endpoint configuration with default credentials and pool size
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            password: String::new(),
            database: 0,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Cache endpoint cannot be empty".to_string(),
            ));
        }
        validate_common(self.database, self.pool_size)
    }
}

impl FailoverConfig {
    /// Create a failover configuration with default credentials and pool size
    pub fn new(master_name: impl Into<String>, sentinel_endpoints: Vec<String>) -> Self {
        Self {
            master_name: master_name.into(),
            sentinel_endpoints,
            password: String::new(),
            database: 0,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.master_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Failover master_name cannot be empty".to_string(),
            ));
        }
        if self.sentinel_endpoints.is_empty() {
            return Err(ConfigError::Invalid(
                "Failover sentinel_endpoints cannot be empty".to_string(),
            ));
        }
        if self
            .sentinel_endpoints
            .iter()
            .any(|endpoint| endpoint.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "Failover sentinel endpoint cannot be empty".to_string(),
            ));
        }
        validate_common(self.database, self.pool_size)
    }
}

fn validate_common(database: i64, pool_size: u32) -> Result<(), ConfigError> {
    if database < 0 {
        return Err(ConfigError::Invalid(format!(
            "Cache database index cannot be negative: {}",
            database
        )));
    }
    if pool_size == 0 {
        return Err(ConfigError::Invalid(
            "Cache pool_size must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn redact(password: &str) -> &'static str {
    if password.is_empty() { "" } else { "***" }
}

// Passwords never show up in logs
impl fmt::Debug for SingleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleConfig")
            .field("endpoint", &self.endpoint)
            .field("password", &redact(&self.password))
            .field("database", &self.database)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

impl fmt::Debug for FailoverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailoverConfig")
            .field("master_name", &self.master_name)
            .field("sentinel_endpoints", &self.sentinel_endpoints)
            .field("password", &redact(&self.password))
            .field("database", &self.database)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}
