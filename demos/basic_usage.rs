//! # Basic Usage Example
//!
//! This example demonstrates the cache against a single Redis endpoint:
//! - Building the cache from a topology
//! - Get / set / delete through the cache contract
//! - Set-if-absent and expiry
//!
//! Run with a local Redis: `docker run -d -p 6379:6379 redis:7-alpine`

use cachehaus::prelude::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let endpoint = std::env::var("REDIS_ENDPOINT").unwrap_or_else(|_| "localhost:6379".to_string());
    let cache = cachehaus::init(Some(SingleConfig::new(endpoint).with_pool_size(4)), None)?;

    if let Err(e) = cache.ping().await {
        println!("Redis connection failed: {}", e);
        return Ok(());
    }

    cache.set(b"greeting", b"hello").await?;
    let value = cache.get(b"greeting").await?;
    println!("greeting = {}", String::from_utf8_lossy(&value));

    let acquired = cache.set_nx(b"lock:job", b"worker-1", Duration::from_secs(5)).await?;
    let again = cache.set_nx(b"lock:job", b"worker-2", Duration::from_secs(5)).await?;
    println!("first lock attempt: {}, second: {}", acquired, again);

    cache.expire(b"greeting", Duration::from_secs(60)).await?;
    println!("greeting exists: {}", cache.exists(b"greeting").await?);

    cache.delete(b"greeting").await?;
    cache.delete(b"lock:job").await?;

    match cache.get(b"greeting").await {
        Err(e) if e.is_not_found() => println!("greeting removed"),
        other => println!("unexpected result: {:?}", other),
    }

    Ok(())
}
