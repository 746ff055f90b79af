//! In-memory lock client for tests
//!
//! Implements exactly the two operations the Redis client uses: SET NX PX
//! and the conditional delete, TTL included.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{LockClient, LockClientError};

struct Entry {
    token: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryLockClient {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryLockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently held (unexpired) keys, sorted.
    pub fn held_keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, e)| e.expires_at > now)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn value_of(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.token.clone())
    }

    /// Test hook: overwrite a key unconditionally, as if its TTL expired and
    /// another caller reacquired it.
    pub fn force_set(&self, key: &str, token: &str) {
        self.entries.lock().unwrap().insert(
            key.to_string(),
            Entry {
                token: token.to_string(),
                expires_at: Instant::now() + Duration::from_secs(3600),
            },
        );
    }
}

#[async_trait]
impl LockClient for InMemoryLockClient {
    async fn set_nx_px(&self, key: &str, token: &str, ttl_ms: u64) -> Result<bool, LockClientError> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();

        if let Some(existing) = entries.get(key) {
            if existing.expires_at > now {
                return Ok(false);
            }
        }

        entries.insert(
            key.to_string(),
            Entry {
                token: token.to_string(),
                expires_at: now + Duration::from_millis(ttl_ms),
            },
        );
        Ok(true)
    }

    async fn del_if_match(&self, key: &str, token: &str) -> Result<(), LockClientError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.get(key) {
            if existing.token == token {
                entries.remove(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_nx_semantics() {
        let client = InMemoryLockClient::new();
        assert!(client.set_nx_px("k", "t1", 5000).await.unwrap());
        assert!(!client.set_nx_px("k", "t2", 5000).await.unwrap());
        assert_eq!(client.value_of("k"), Some("t1".to_string()));
    }

    #[tokio::test]
    async fn test_expired_key_can_be_reacquired() {
        let client = InMemoryLockClient::new();
        assert!(client.set_nx_px("k", "t1", 1).await.unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(client.set_nx_px("k", "t2", 5000).await.unwrap());
        assert_eq!(client.value_of("k"), Some("t2".to_string()));
    }

    #[tokio::test]
    async fn test_conditional_delete() {
        let client = InMemoryLockClient::new();
        client.set_nx_px("k", "t1", 5000).await.unwrap();

        client.del_if_match("k", "wrong").await.unwrap();
        assert_eq!(client.value_of("k"), Some("t1".to_string()));

        client.del_if_match("k", "t1").await.unwrap();
        assert_eq!(client.value_of("k"), None);
    }
}
