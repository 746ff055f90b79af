//! Liveness probe

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use super::super::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = "up")]
    pub database: &'static str,
    #[schema(example = "up")]
    pub cache: &'static str,
}

/// Service health
///
/// GET /health
///
/// A degraded dependency is reported, not fatal: the probe always answers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Dependency status", body = HealthStatus)),
    tag = "Health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let database = match state.db.health_check().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!("Health probe: database down: {}", e);
            "down"
        }
    };

    let cache = match ping_redis(&state.redis).await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!("Health probe: cache down: {}", e);
            "down"
        }
    };

    let status = if database == "up" && cache == "up" {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthStatus {
        status,
        database,
        cache,
    })
}

async fn ping_redis(client: &redis::Client) -> redis::RedisResult<()> {
    let mut con = client.get_multiplexed_async_connection().await?;
    let _pong: String = redis::cmd("PING").query_async(&mut con).await?;
    Ok(())
}
