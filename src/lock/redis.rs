//! Redis lock client: SET NX PX plus a compare-and-delete script

use async_trait::async_trait;

use super::{LockClient, LockClientError};

/// Conditional delete: remove the key only while we still own it.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

pub struct RedisLockClient {
    client: redis::Client,
    release_script: redis::Script,
}

impl RedisLockClient {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            release_script: redis::Script::new(RELEASE_SCRIPT),
        }
    }
}

#[async_trait]
impl LockClient for RedisLockClient {
    async fn set_nx_px(&self, key: &str, token: &str, ttl_ms: u64) -> Result<bool, LockClientError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| LockClientError::Backend(e.to_string()))?;

        // SET key token NX PX ttl -> "OK" when acquired, nil when held
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut con)
            .await
            .map_err(|e| LockClientError::Backend(e.to_string()))?;

        Ok(reply.is_some())
    }

    async fn del_if_match(&self, key: &str, token: &str) -> Result<(), LockClientError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| LockClientError::Backend(e.to_string()))?;

        let _deleted: i64 = self
            .release_script
            .key(key)
            .arg(token)
            .invoke_async(&mut con)
            .await
            .map_err(|e| LockClientError::Backend(e.to_string()))?;

        Ok(())
    }
}
