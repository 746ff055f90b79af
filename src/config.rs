//! Service configuration
//!
//! Everything comes from the environment; defaults cover local development.
//! Malformed values fail startup instead of silently falling back.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP bind port
    pub port: u16,
    /// PostgreSQL DSN
    pub database_url: String,
    /// Redis endpoint for the idempotency cache and wallet locks
    pub redis_url: String,
    /// TTL for cached idempotency responses
    pub idempotency_cache_ttl_seconds: u64,
    /// Per-attempt TTL on distributed lock keys
    pub distributed_lock_ttl_ms: u64,
    /// Max lock acquisition attempts
    pub distributed_lock_retry_count: u32,
    /// Base backoff between attempts (multiplied by attempt number)
    pub distributed_lock_retry_delay_ms: u64,
    pub log_level: String,
    /// File logging is enabled only when a directory is configured
    pub log_dir: Option<String>,
    pub log_file: String,
    pub log_json: bool,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            port: env_parse("PORT", 8080)?,
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            idempotency_cache_ttl_seconds: env_parse("IDEMPOTENCY_CACHE_TTL_SECONDS", 86_400)?,
            distributed_lock_ttl_ms: env_parse("DISTRIBUTED_LOCK_TTL_MS", 5_000)?,
            distributed_lock_retry_count: env_parse("DISTRIBUTED_LOCK_RETRY_COUNT", 3)?,
            distributed_lock_retry_delay_ms: env_parse("DISTRIBUTED_LOCK_RETRY_DELAY_MS", 50)?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_dir: std::env::var("LOG_DIR").ok(),
            log_file: std::env::var("LOG_FILE").unwrap_or_else(|_| "coinvault.log".to_string()),
            log_json: env_parse("LOG_JSON", false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration at startup
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Invalid PORT: must be > 0");
        }

        if self.redis_url.is_empty() {
            anyhow::bail!("Invalid REDIS_URL: must not be empty");
        }

        if self.idempotency_cache_ttl_seconds == 0 {
            anyhow::bail!("Invalid IDEMPOTENCY_CACHE_TTL_SECONDS: must be > 0");
        }

        if self.distributed_lock_ttl_ms == 0 {
            anyhow::bail!("Invalid DISTRIBUTED_LOCK_TTL_MS: must be > 0");
        }

        if self.distributed_lock_retry_count == 0 {
            anyhow::bail!("Invalid DISTRIBUTED_LOCK_RETRY_COUNT: must be >= 1");
        }

        if self.distributed_lock_retry_delay_ms == 0 {
            anyhow::bail!("Invalid DISTRIBUTED_LOCK_RETRY_DELAY_MS: must be > 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid LOG_LEVEL '{}': must be one of {:?}",
                self.log_level,
                valid_levels
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            port: 8080,
            database_url: "postgres://localhost/coinvault".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            idempotency_cache_ttl_seconds: 86_400,
            distributed_lock_ttl_ms: 5_000,
            distributed_lock_retry_count: 3,
            distributed_lock_retry_delay_ms: 50,
            log_level: "info".to_string(),
            log_dir: None,
            log_file: "coinvault.log".to_string(),
            log_json: false,
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = base_config();
        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = base_config();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_retry_count() {
        let mut config = base_config();
        config.distributed_lock_retry_count = 0;
        assert!(config.validate().is_err());
    }
}
