//! HTTP gateway
//!
//! Thin transport over the wallet engine: routing, the error boundary, and
//! the OpenAPI document. All domain decisions live in the engine.

pub mod handlers;
pub mod openapi;
pub mod state;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::error::AppError;
use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/wallet/topup", post(handlers::wallet::topup))
        .route("/wallet/bonus", post(handlers::wallet::bonus))
        .route("/wallet/spend", post(handlers::wallet::spend))
        .route("/wallet/{user_id}/balance", get(handlers::wallet::balance))
        .route("/health", get(handlers::health::health_check))
        .route("/api-doc/openapi.json", get(serve_openapi))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

async fn route_not_found() -> AppError {
    AppError::route_not_found()
}

/// Bind and serve until the process is stopped.
pub async fn run_server(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Gateway listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
