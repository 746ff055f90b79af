//! Engine request and response types

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Validated mutation request as delivered by the transport layer.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub user_id: Uuid,
    pub asset_code: String,
    pub amount: i64,
    pub idempotency_key: String,
    pub request_fingerprint: String,
}

/// Terminal outcome of a mutation: the HTTP-shaped response the transport
/// renders, plus whether it was replayed from the idempotency log.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub status_code: u16,
    pub body: Value,
    pub replayed: bool,
}

/// Success payload persisted onto the transaction row and served on replays.
/// Amounts and balances travel as decimal strings.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessPayload {
    pub transaction_id: Uuid,
    pub idempotency_key: String,
    #[schema(example = "topup")]
    pub operation: &'static str,
    pub user_id: Uuid,
    #[schema(example = "GOLD_COINS")]
    pub asset_code: String,
    #[schema(example = "100")]
    pub amount: String,
    #[schema(example = "1100")]
    pub balance: String,
    pub from_wallet_id: Uuid,
    pub to_wallet_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One balance line of the balance query response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    #[schema(example = "GOLD_COINS")]
    pub asset_code: String,
    #[schema(example = "Gold Coins")]
    pub asset_name: String,
    #[schema(example = "1050")]
    pub balance: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub balances: Vec<BalanceEntry>,
}
