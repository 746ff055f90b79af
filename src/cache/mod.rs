//! Fast idempotency cache
//!
//! Non-authoritative key -> (fingerprint, status, body) store with TTL.
//! Reads and writes are best-effort: a miss falls through to the
//! transactions table, an error is logged and swallowed. Nothing here is
//! ever allowed to fail a mutation.

mod memory;
mod redis;

pub use memory::InMemoryResponseCache;
pub use redis::RedisResponseCache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cached outcome of a completed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub fingerprint: String,
    pub status_code: u16,
    pub body: Value,
}

/// Redis key for a cached response.
pub fn response_key(idempotency_key: &str) -> String {
    format!("idem:response:{}", idempotency_key)
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Best-effort lookup. `None` on miss or on any cache error.
    async fn get(&self, idempotency_key: &str) -> Option<CachedResponse>;

    /// Best-effort write-through. Errors are logged, never surfaced.
    async fn put(&self, idempotency_key: &str, entry: &CachedResponse);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_key_format() {
        assert_eq!(response_key("abc-123"), "idem:response:abc-123");
    }

    #[test]
    fn test_cached_response_round_trips_as_json() {
        let entry = CachedResponse {
            fingerprint: "f".repeat(64),
            status_code: 200,
            body: serde_json::json!({"balance": "1050"}),
        };
        let raw = serde_json::to_string(&entry).unwrap();
        let back: CachedResponse = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, entry);
    }
}
