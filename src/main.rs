use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use coinvault::cache::RedisResponseCache;
use coinvault::config::AppConfig;
use coinvault::engine::WalletEngine;
use coinvault::gateway::{self, state::AppState};
use coinvault::lock::{RedisLockClient, WalletLock};
use coinvault::logging;
use coinvault::store::Database;

/// Connect to PostgreSQL with bounded retry. The database regularly comes up
/// after the service in containerized deployments.
async fn connect_database(database_url: &str) -> Result<Database> {
    const MAX_RETRIES: u32 = 10;
    let mut retry_delay_ms = 1000u64;

    for attempt in 1..=MAX_RETRIES {
        match Database::connect(database_url).await {
            Ok(db) => {
                if attempt > 1 {
                    tracing::info!(attempt, "PostgreSQL connection established after retry");
                }
                return Ok(db);
            }
            Err(e) if attempt == MAX_RETRIES => {
                return Err(e).with_context(|| {
                    format!("Failed to connect to PostgreSQL after {} attempts", MAX_RETRIES)
                });
            }
            Err(e) => {
                tracing::warn!(
                    "PostgreSQL connection attempt {} failed: {}. Retrying in {}ms...",
                    attempt,
                    e,
                    retry_delay_ms
                );
                tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
                retry_delay_ms = (retry_delay_ms * 2).min(30_000);
            }
        }
    }

    anyhow::bail!("PostgreSQL connection retries exhausted")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    let _log_guard = logging::init_logging(&config);

    tracing::info!(port = config.port, "Starting coinvault");

    let db = connect_database(&config.database_url).await?;

    // Client construction is lazy; cache and lock calls open connections
    // per command and tolerate failure on their own.
    let redis_client =
        redis::Client::open(config.redis_url.as_str()).context("Invalid REDIS_URL")?;

    let cache = Arc::new(RedisResponseCache::new(
        redis_client.clone(),
        config.idempotency_cache_ttl_seconds,
    ));

    let lock = WalletLock::new(
        Arc::new(RedisLockClient::new(redis_client.clone())),
        config.distributed_lock_ttl_ms,
        config.distributed_lock_retry_count,
        config.distributed_lock_retry_delay_ms,
    );

    let engine = Arc::new(WalletEngine::new(db.clone(), cache, lock));
    let state = Arc::new(AppState::new(engine, db, redis_client));

    gateway::run_server(config.port, state).await
}
