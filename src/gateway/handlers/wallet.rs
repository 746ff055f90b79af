//! Wallet mutation and balance handlers
//!
//! Handlers fingerprint the body exactly as received (before typed parsing),
//! so the digest is invariant to key order but sensitive to value encoding.
//! The idempotency gate runs inside the engine; handlers only assemble the
//! validated request and render the outcome.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::amount::{WireAmount, parse_amount};
use crate::engine::types::{BalanceResponse, MutationRequest};
use crate::error::AppError;
use crate::fingerprint::fingerprint;
use crate::store::models::TransactionType;

use super::super::state::AppState;

const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
const IDEMPOTENCY_REPLAYED_HEADER: &str = "Idempotency-Replayed";

/// Typed mutation body, parsed from the already-fingerprinted JSON.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MutationBody {
    user_id: Uuid,
    #[schema(example = "GOLD_COINS")]
    asset_code: String,
    #[schema(value_type = String, example = "100")]
    amount: WireAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    asset_code: Option<String>,
}

fn idempotency_key(headers: &HeaderMap) -> Result<String, AppError> {
    let value = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .ok_or_else(AppError::idempotency_key_missing)?;
    let key = value
        .to_str()
        .map_err(|_| AppError::validation("Idempotency-Key header is not valid UTF-8"))?
        .trim();
    if key.is_empty() {
        return Err(AppError::idempotency_key_missing());
    }
    Ok(key.to_string())
}

/// Assemble the engine request: fingerprint the raw body, then parse it.
fn build_request(
    path: &str,
    headers: &HeaderMap,
    raw: &Value,
) -> Result<MutationRequest, AppError> {
    let key = idempotency_key(headers)?;
    let request_fingerprint = fingerprint("POST", path, raw);

    let body: MutationBody = serde_json::from_value(raw.clone())
        .map_err(|e| AppError::validation(format!("Invalid request body: {}", e)))?;

    if body.asset_code.is_empty() || body.asset_code.len() > 50 {
        return Err(AppError::validation(
            "assetCode must be between 1 and 50 characters",
        ));
    }

    let amount = parse_amount(&body.amount)
        .map_err(|e| AppError::validation(format!("Invalid amount: {}", e)))?;

    Ok(MutationRequest {
        user_id: body.user_id,
        asset_code: body.asset_code,
        amount,
        idempotency_key: key,
        request_fingerprint,
    })
}

async fn run_mutation(
    state: Arc<AppState>,
    tx_type: TransactionType,
    path: &str,
    headers: HeaderMap,
    raw: Value,
) -> Result<Response, AppError> {
    let req = build_request(path, &headers, &raw)?;

    let outcome = match tx_type {
        TransactionType::Topup => state.engine.topup(req).await?,
        TransactionType::Bonus => state.engine.bonus(req).await?,
        TransactionType::Spend => state.engine.spend(req).await?,
    };

    let status =
        StatusCode::from_u16(outcome.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(outcome.body)).into_response();
    if outcome.replayed {
        response
            .headers_mut()
            .insert(IDEMPOTENCY_REPLAYED_HEADER, HeaderValue::from_static("true"));
    }
    Ok(response)
}

/// Credit a user wallet from TREASURY
///
/// POST /wallet/topup
#[utoipa::path(
    post,
    path = "/wallet/topup",
    request_body = MutationBody,
    params(("Idempotency-Key" = String, Header, description = "Client idempotency key")),
    responses(
        (status = 200, description = "Posting committed (or replayed)"),
        (status = 400, description = "Validation failure or missing idempotency key"),
        (status = 404, description = "Unknown user, asset, or wallet"),
        (status = 409, description = "Idempotency or concurrency conflict"),
        (status = 423, description = "Wallet lock unavailable")
    ),
    tag = "Wallet"
)]
pub async fn topup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<Response, AppError> {
    run_mutation(state, TransactionType::Topup, "/wallet/topup", headers, raw).await
}

/// Credit a user wallet from TREASURY (reported separately from topup)
///
/// POST /wallet/bonus
#[utoipa::path(
    post,
    path = "/wallet/bonus",
    request_body = MutationBody,
    params(("Idempotency-Key" = String, Header, description = "Client idempotency key")),
    responses(
        (status = 200, description = "Posting committed (or replayed)"),
        (status = 400, description = "Validation failure or missing idempotency key"),
        (status = 404, description = "Unknown user, asset, or wallet"),
        (status = 409, description = "Idempotency or concurrency conflict"),
        (status = 423, description = "Wallet lock unavailable")
    ),
    tag = "Wallet"
)]
pub async fn bonus(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<Response, AppError> {
    run_mutation(state, TransactionType::Bonus, "/wallet/bonus", headers, raw).await
}

/// Debit a user wallet into TREASURY
///
/// POST /wallet/spend
#[utoipa::path(
    post,
    path = "/wallet/spend",
    request_body = MutationBody,
    params(("Idempotency-Key" = String, Header, description = "Client idempotency key")),
    responses(
        (status = 200, description = "Posting committed (or replayed)"),
        (status = 400, description = "Validation failure or missing idempotency key"),
        (status = 404, description = "Unknown user, asset, or wallet"),
        (status = 409, description = "Insufficient funds or idempotency conflict"),
        (status = 423, description = "Wallet lock unavailable")
    ),
    tag = "Wallet"
)]
pub async fn spend(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<Response, AppError> {
    run_mutation(state, TransactionType::Spend, "/wallet/spend", headers, raw).await
}

/// Per-asset derived balances for a user
///
/// GET /wallet/{userId}/balance?assetCode=CODE
#[utoipa::path(
    get,
    path = "/wallet/{user_id}/balance",
    params(
        ("user_id" = String, Path, description = "User id"),
        ("assetCode" = Option<String>, Query, description = "Optional asset code filter")
    ),
    responses(
        (status = 200, description = "Balances sorted by asset code", body = BalanceResponse),
        (status = 400, description = "Malformed user id"),
        (status = 404, description = "Unknown user or no wallet for the asset")
    ),
    tag = "Wallet"
)]
pub async fn balance(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, AppError> {
    let user_id: Uuid = user_id
        .parse()
        .map_err(|_| AppError::validation("userId must be a UUID"))?;

    let response = state
        .engine
        .get_balance(user_id, query.asset_code.as_deref())
        .await?;
    Ok(Json(response))
}
