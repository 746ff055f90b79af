//! In-memory response cache for tests and single-node development

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CachedResponse, ResponseCache, response_key};

#[derive(Default)]
pub struct InMemoryResponseCache {
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl InMemoryResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, idempotency_key: &str) -> Option<CachedResponse> {
        self.entries
            .lock()
            .unwrap()
            .get(&response_key(idempotency_key))
            .cloned()
    }

    async fn put(&self, idempotency_key: &str, entry: &CachedResponse) {
        self.entries
            .lock()
            .unwrap()
            .insert(response_key(idempotency_key), entry.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = InMemoryResponseCache::new();
        let entry = CachedResponse {
            fingerprint: "abc".to_string(),
            status_code: 200,
            body: serde_json::json!({"ok": true}),
        };

        assert!(cache.get("k1").await.is_none());
        cache.put("k1", &entry).await;
        assert_eq!(cache.get("k1").await.unwrap(), entry);
        assert!(cache.get("k2").await.is_none());
    }
}
