//! Data models for the ledger store

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Counterparty for every user-visible mutation.
pub const TREASURY: &str = "TREASURY";
/// Bootstrap funding source. Operator-only; never referenced at runtime.
pub const ISSUANCE: &str = "ISSUANCE";

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AssetType {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

/// Wallet owner shape: exactly one of user / system code is set, enforced by
/// a database check constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerType {
    User,
    System,
}

impl OwnerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerType::User => "USER",
            OwnerType::System => "SYSTEM",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(OwnerType::User),
            "SYSTEM" => Some(OwnerType::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Wallet {
    pub id: Uuid,
    pub owner_type: OwnerType,
    pub user_id: Option<Uuid>,
    pub system_code: Option<String>,
    pub asset_type_id: Uuid,
    pub version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Topup,
    Bonus,
    Spend,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Topup => "TOPUP",
            TransactionType::Bonus => "BONUS",
            TransactionType::Spend => "SPEND",
        }
    }

    /// Wire name used in success payloads.
    pub fn operation(&self) -> &'static str {
        match self {
            TransactionType::Topup => "topup",
            TransactionType::Bonus => "bonus",
            TransactionType::Spend => "spend",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TOPUP" => Some(TransactionType::Topup),
            "BONUS" => Some(TransactionType::Bonus),
            "SPEND" => Some(TransactionType::Spend),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Processing,
    Posted,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::Posted => "POSTED",
            TransactionStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PROCESSING" => Some(TransactionStatus::Processing),
            "POSTED" => Some(TransactionStatus::Posted),
            "FAILED" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Debit => "DEBIT",
            EntryType::Credit => "CREDIT",
        }
    }
}

/// Audit record and idempotency log in one row.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub idempotency_key: String,
    pub request_fingerprint: String,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: i64,
    pub asset_type_id: Uuid,
    pub source_wallet_id: Uuid,
    pub destination_wallet_id: Uuid,
    pub response_code: Option<i32>,
    pub response_body: Option<Value>,
    pub error_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-asset balance row of the grouped balance query.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetBalance {
    pub asset_code: String,
    pub asset_name: String,
    pub balance: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trips() {
        for t in [TransactionType::Topup, TransactionType::Bonus, TransactionType::Spend] {
            assert_eq!(TransactionType::from_str(t.as_str()), Some(t));
        }
        for s in [
            TransactionStatus::Processing,
            TransactionStatus::Posted,
            TransactionStatus::Failed,
        ] {
            assert_eq!(TransactionStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(TransactionType::from_str("REFUND"), None);
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(TransactionType::Topup.operation(), "topup");
        assert_eq!(TransactionType::Bonus.operation(), "bonus");
        assert_eq!(TransactionType::Spend.operation(), "spend");
    }
}
