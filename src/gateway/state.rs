//! Shared gateway state

use std::sync::Arc;

use crate::engine::WalletEngine;
use crate::store::Database;

#[derive(Clone)]
pub struct AppState {
    /// Wallet mutation engine
    pub engine: Arc<WalletEngine>,
    /// Database handle, used directly only by the health probe
    pub db: Database,
    /// Redis client, used directly only by the health probe
    pub redis: redis::Client,
}

impl AppState {
    pub fn new(engine: Arc<WalletEngine>, db: Database, redis: redis::Client) -> Self {
        Self { engine, db, redis }
    }
}
