//! Redis-backed response cache

use async_trait::async_trait;
use redis::AsyncCommands;

use super::{CachedResponse, ResponseCache, response_key};

pub struct RedisResponseCache {
    client: redis::Client,
    ttl_seconds: u64,
}

impl RedisResponseCache {
    pub fn new(client: redis::Client, ttl_seconds: u64) -> Self {
        Self {
            client,
            ttl_seconds,
        }
    }

    async fn try_get(&self, key: &str) -> redis::RedisResult<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.get(response_key(key)).await
    }

    async fn try_put(&self, key: &str, payload: &str) -> redis::RedisResult<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.set_ex(response_key(key), payload, self.ttl_seconds)
            .await
    }
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    async fn get(&self, idempotency_key: &str) -> Option<CachedResponse> {
        match self.try_get(idempotency_key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(key = idempotency_key, "Corrupt cache entry dropped: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = idempotency_key, "Idempotency cache read failed: {}", e);
                None
            }
        }
    }

    async fn put(&self, idempotency_key: &str, entry: &CachedResponse) {
        let payload = match serde_json::to_string(entry) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(key = idempotency_key, "Cache entry serialization failed: {}", e);
                return;
            }
        };
        if let Err(e) = self.try_put(idempotency_key, &payload).await {
            tracing::warn!(key = idempotency_key, "Idempotency cache write failed: {}", e);
        }
    }
}
