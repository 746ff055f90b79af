//! Transaction rows: the audit record and the idempotency log
//!
//! The unique index on `idempotency_key` is the authoritative serialization
//! point for competing first-time requests. The loser of an insert race must
//! read the winner's row, so duplicates surface as a distinguishable outcome
//! rather than ON CONFLICT DO NOTHING.

use serde_json::Value;
use sqlx::postgres::PgConnection;
use sqlx::Row;
use uuid::Uuid;

use super::models::{TransactionRecord, TransactionStatus, TransactionType};

/// Fields of a fresh PROCESSING row.
#[derive(Debug)]
pub struct NewTransaction<'a> {
    pub idempotency_key: &'a str,
    pub request_fingerprint: &'a str,
    pub tx_type: TransactionType,
    pub amount: i64,
    pub asset_type_id: Uuid,
    pub source_wallet_id: Uuid,
    pub destination_wallet_id: Uuid,
}

/// Outcome of attempting to insert a PROCESSING row.
#[derive(Debug)]
pub enum InsertOutcome {
    /// We won the race; this row is ours to drive to a terminal state.
    Inserted(TransactionRecord),
    /// Another request with this idempotency key got there first.
    DuplicateKey,
}

pub struct TransactionRepository;

impl TransactionRepository {
    pub async fn insert_processing(
        conn: &mut PgConnection,
        new: &NewTransaction<'_>,
    ) -> Result<InsertOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions
                (idempotency_key, request_fingerprint, tx_type, status, amount,
                 asset_type_id, source_wallet_id, destination_wallet_id)
            VALUES ($1, $2, $3, 'PROCESSING', $4, $5, $6, $7)
            RETURNING id, created_at
            "#,
        )
        .bind(new.idempotency_key)
        .bind(new.request_fingerprint)
        .bind(new.tx_type.as_str())
        .bind(new.amount)
        .bind(new.asset_type_id)
        .bind(new.source_wallet_id)
        .bind(new.destination_wallet_id)
        .fetch_one(conn)
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Inserted(TransactionRecord {
                id: row.get("id"),
                idempotency_key: new.idempotency_key.to_string(),
                request_fingerprint: new.request_fingerprint.to_string(),
                tx_type: new.tx_type,
                status: TransactionStatus::Processing,
                amount: new.amount,
                asset_type_id: new.asset_type_id,
                source_wallet_id: new.source_wallet_id,
                destination_wallet_id: new.destination_wallet_id,
                response_code: None,
                response_body: None,
                error_code: None,
                created_at: row.get("created_at"),
            })),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::DuplicateKey),
            Err(e) => Err(e),
        }
    }

    pub async fn get_by_idempotency_key(
        conn: &mut PgConnection,
        idempotency_key: &str,
    ) -> Result<Option<TransactionRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, idempotency_key, request_fingerprint, tx_type, status, amount,
                   asset_type_id, source_wallet_id, destination_wallet_id,
                   response_code, response_body, error_code, created_at
            FROM transactions
            WHERE idempotency_key = $1
            "#,
        )
        .bind(idempotency_key)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(row_to_record))
    }

    /// Move a PROCESSING row to its terminal state with the response that
    /// replays will serve.
    pub async fn finalize(
        conn: &mut PgConnection,
        id: Uuid,
        status: TransactionStatus,
        response_code: i32,
        response_body: &Value,
        error_code: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE transactions
            SET status = $1, response_code = $2, response_body = $3,
                error_code = $4, updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(status.as_str())
        .bind(response_code)
        .bind(response_body)
        .bind(error_code)
        .bind(id)
        .execute(conn)
        .await?;

        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

fn row_to_record(row: sqlx::postgres::PgRow) -> TransactionRecord {
    let tx_type: String = row.get("tx_type");
    let status: String = row.get("status");
    TransactionRecord {
        id: row.get("id"),
        idempotency_key: row.get("idempotency_key"),
        request_fingerprint: row.get::<String, _>("request_fingerprint").trim().to_string(),
        // Check constraints admit only the known discriminants
        tx_type: TransactionType::from_str(&tx_type).unwrap_or(TransactionType::Topup),
        status: TransactionStatus::from_str(&status).unwrap_or(TransactionStatus::Processing),
        amount: row.get("amount"),
        asset_type_id: row.get("asset_type_id"),
        source_wallet_id: row.get("source_wallet_id"),
        destination_wallet_id: row.get("destination_wallet_id"),
        response_code: row.get("response_code"),
        response_body: row.get("response_body"),
        error_code: row.get("error_code"),
        created_at: row.get("created_at"),
    }
}
