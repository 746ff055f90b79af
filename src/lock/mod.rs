//! Distributed wallet lock
//!
//! Acquires one named mutual-exclusion key per wallet across service
//! instances, always in the canonical sorted order, with bounded retry and
//! token-scoped release. This narrows the race window before database row
//! locks are taken; correctness does not depend on it.

mod memory;
mod redis;

pub use memory::InMemoryLockClient;
pub use redis::RedisLockClient;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::concurrency::wallet_lock_keys;
use crate::error::AppError;

#[derive(Debug, Error)]
pub enum LockClientError {
    #[error("Lock backend error: {0}")]
    Backend(String),
}

/// Minimal lock-store interface: single-writer compare-and-set with TTL,
/// and compare-and-delete. This is all Redis needs to provide.
#[async_trait]
pub trait LockClient: Send + Sync {
    /// Set `key -> token` with expiry iff the key is absent.
    /// Returns true when the key was acquired.
    async fn set_nx_px(&self, key: &str, token: &str, ttl_ms: u64) -> Result<bool, LockClientError>;

    /// Delete `key` iff its current value equals `token`.
    async fn del_if_match(&self, key: &str, token: &str) -> Result<(), LockClientError>;
}

/// Held lock set. Release is token-scoped: a key whose TTL expired and was
/// reacquired by another caller is never deleted by us.
pub struct LockGuard {
    client: Arc<dyn LockClient>,
    keys: Vec<String>,
    token: String,
    released: bool,
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("keys", &self.keys)
            .field("token", &self.token)
            .field("released", &self.released)
            .finish()
    }
}

impl LockGuard {
    /// Release every held key. Errors are logged, never propagated.
    pub async fn release(mut self) {
        self.released = true;
        release_keys(&*self.client, &self.keys, &self.token).await;
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Dropped without an explicit release: the holding task was cancelled
        // or panicked. Fire a best-effort release so the keys do not linger
        // until TTL expiry.
        let client = Arc::clone(&self.client);
        let keys = std::mem::take(&mut self.keys);
        let token = std::mem::take(&mut self.token);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                release_keys(&*client, &keys, &token).await;
            });
        }
    }
}

async fn release_keys(client: &dyn LockClient, keys: &[String], token: &str) {
    for key in keys {
        if let Err(e) = client.del_if_match(key, token).await {
            tracing::warn!(key = %key, "Lock release failed: {}", e);
        }
    }
}

/// Cross-instance wallet lock with bounded retry.
#[derive(Clone)]
pub struct WalletLock {
    client: Arc<dyn LockClient>,
    ttl_ms: u64,
    retry_count: u32,
    retry_delay_ms: u64,
}

impl WalletLock {
    pub fn new(client: Arc<dyn LockClient>, ttl_ms: u64, retry_count: u32, retry_delay_ms: u64) -> Self {
        Self {
            client,
            ttl_ms,
            retry_count,
            retry_delay_ms,
        }
    }

    /// Acquire locks over the given wallet set.
    ///
    /// Keys are derived and acquired in the canonical sorted order. A failed
    /// attempt releases its own partial acquisitions, backs off
    /// `retry_delay * attempt`, and retries up to the configured count.
    pub async fn acquire(&self, wallet_ids: &[Uuid]) -> Result<LockGuard, AppError> {
        let keys = wallet_lock_keys(wallet_ids);
        if keys.is_empty() {
            return Err(AppError::lock_keys_missing());
        }

        for attempt in 1..=self.retry_count {
            let token = Uuid::new_v4().to_string();
            match self.try_acquire_all(&keys, &token).await {
                Ok(true) => {
                    tracing::debug!(keys = keys.len(), attempt, "Wallet lock acquired");
                    return Ok(LockGuard {
                        client: Arc::clone(&self.client),
                        keys,
                        token,
                        released: false,
                    });
                }
                Ok(false) => {
                    tracing::debug!(attempt, "Wallet lock contended, backing off");
                }
                Err(e) => {
                    tracing::warn!(attempt, "Wallet lock backend error: {}", e);
                }
            }

            if attempt < self.retry_count {
                tokio::time::sleep(Duration::from_millis(
                    self.retry_delay_ms * u64::from(attempt),
                ))
                .await;
            }
        }

        tracing::warn!(
            attempts = self.retry_count,
            "Wallet lock not acquired, giving up"
        );
        Err(AppError::lock_unavailable())
    }

    /// Acquire every key for one attempt, releasing this attempt's partial
    /// acquisitions on any failure.
    async fn try_acquire_all(&self, keys: &[String], token: &str) -> Result<bool, LockClientError> {
        let mut held: Vec<&String> = Vec::with_capacity(keys.len());
        for key in keys {
            match self.client.set_nx_px(key, token, self.ttl_ms).await {
                Ok(true) => held.push(key),
                Ok(false) => {
                    for held_key in held {
                        let _ = self.client.del_if_match(held_key, token).await;
                    }
                    return Ok(false);
                }
                Err(e) => {
                    for held_key in held {
                        let _ = self.client.del_if_match(held_key, token).await;
                    }
                    return Err(e);
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn test_lock(client: Arc<dyn LockClient>) -> WalletLock {
        WalletLock::new(client, 5000, 3, 1)
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let client = Arc::new(InMemoryLockClient::new());
        let lock = test_lock(client.clone());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let guard = lock.acquire(&[a, b]).await.unwrap();
        assert_eq!(client.held_keys(), wallet_lock_keys(&[a, b]));

        guard.release().await;
        assert!(client.held_keys().is_empty());
    }

    #[tokio::test]
    async fn test_empty_wallet_set_is_a_user_error() {
        let lock = test_lock(Arc::new(InMemoryLockClient::new()));
        let err = lock.acquire(&[]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::LockKeysMissing);
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_contended_lock_exhausts_retries() {
        let client = Arc::new(InMemoryLockClient::new());
        let wallet = Uuid::new_v4();

        // Another instance holds the key for the whole test
        let key = wallet_lock_keys(&[wallet]).remove(0);
        client
            .set_nx_px(&key, "other-instance", 60_000)
            .await
            .unwrap();

        let lock = test_lock(client.clone());
        let err = lock.acquire(&[wallet]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DistributedLockNotAcquired);
        assert_eq!(err.status, axum::http::StatusCode::LOCKED);

        // The foreign holder was never disturbed
        assert_eq!(client.value_of(&key), Some("other-instance".to_string()));
    }

    #[tokio::test]
    async fn test_partial_acquisition_is_rolled_back() {
        let client = Arc::new(InMemoryLockClient::new());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        // Block whichever key sorts second, so the first is acquired then
        // must be released when the attempt fails.
        let keys = wallet_lock_keys(&[a, b]);
        client
            .set_nx_px(&keys[1], "other-instance", 60_000)
            .await
            .unwrap();

        let lock = test_lock(client.clone());
        let err = lock.acquire(&[a, b]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DistributedLockNotAcquired);

        // Only the foreign key remains held
        assert_eq!(client.held_keys(), vec![keys[1].clone()]);
    }

    #[tokio::test]
    async fn test_release_is_token_scoped() {
        let client = Arc::new(InMemoryLockClient::new());
        let wallet = Uuid::new_v4();
        let key = wallet_lock_keys(&[wallet]).remove(0);

        let lock = test_lock(client.clone());
        let guard = lock.acquire(&[wallet]).await.unwrap();

        // Simulate TTL expiry plus reacquisition by another caller
        client.force_set(&key, "second-owner");
        guard.release().await;

        // Our release must not remove the new owner's lock
        assert_eq!(client.value_of(&key), Some("second-owner".to_string()));
    }

    #[tokio::test]
    async fn test_drop_releases_in_background() {
        let client = Arc::new(InMemoryLockClient::new());
        let wallet = Uuid::new_v4();

        let lock = test_lock(client.clone());
        let guard = lock.acquire(&[wallet]).await.unwrap();
        drop(guard);

        // The spawned release needs a scheduler turn
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(client.held_keys().is_empty());
    }
}
