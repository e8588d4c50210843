//! # Failover Example
//!
//! Loads the topology from `cachehaus.toml` (or the file named by
//! `CACHEHAUS_CONFIG`) and uses the cache through the shared contract handle.
//!
//! ```toml
//! [cache.failover]
//! master_name = "mymaster"
//! sentinel_endpoints = ["localhost:26379"]
//! ```

use cachehaus::prelude::*;
use chrono::Utc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let haus = CacheHaus::load()?;
    println!("Using {} topology", haus.cache().topology_kind());

    haus.health_check().await?;

    let cache = haus.shared();
    cache.set(b"session:42", b"alice").await?;
    println!(
        "session:42 = {}",
        String::from_utf8_lossy(&cache.get(b"session:42").await?)
    );

    let midnight = Utc::now()
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc());
    if let Some(at) = midnight {
        let updated = haus.cache().expire_at(b"session:42", at).await?;
        println!("session:42 expires at {}: {}", at, updated);
    }

    cache.delete(b"session:42").await?;
    Ok(())
}
