//! coinvault - Closed-loop virtual-currency wallet service
//!
//! Moves integer amounts of named assets between wallets under concurrency,
//! with double-entry ledger integrity and idempotent mutations across
//! retries and service instances.
//!
//! # Modules
//!
//! - [`fingerprint`] - canonical-JSON request digests
//! - [`cache`] - best-effort idempotency response cache
//! - [`lock`] - cross-instance wallet locks
//! - [`store`] - PostgreSQL ledger store
//! - [`concurrency`] - wallet ordering and optimistic-update primitives
//! - [`engine`] - the wallet mutation engine
//! - [`gateway`] - HTTP transport

pub mod amount;
pub mod cache;
pub mod concurrency;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod gateway;
pub mod lock;
pub mod logging;
pub mod store;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use engine::{MutationOutcome, MutationRequest, WalletEngine};
pub use error::{AppError, ErrorCode};
pub use store::Database;
