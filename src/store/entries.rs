//! Append-only ledger entries and balance derivation
//!
//! There is no cached balance column anywhere. A balance is always
//! `SUM(CREDIT) - SUM(DEBIT)` over the (wallet, asset) entry stream.

use sqlx::postgres::PgConnection;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::models::AssetBalance;

pub struct LedgerEntryRepository;

impl LedgerEntryRepository {
    /// Append the two legs of a posting: DEBIT on the source wallet and
    /// CREDIT on the destination, equal amounts, same asset.
    pub async fn append_posting(
        conn: &mut PgConnection,
        transaction_id: Uuid,
        asset_type_id: Uuid,
        source_wallet_id: Uuid,
        destination_wallet_id: Uuid,
        amount: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (transaction_id, wallet_id, asset_type_id, entry_type, amount)
            VALUES ($1, $2, $3, 'DEBIT', $4),
                   ($1, $5, $3, 'CREDIT', $4)
            "#,
        )
        .bind(transaction_id)
        .bind(source_wallet_id)
        .bind(asset_type_id)
        .bind(amount)
        .bind(destination_wallet_id)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Derive one wallet's balance for one asset. Runs inside the mutation
    /// transaction, after the wallet row is locked.
    pub async fn balance(
        conn: &mut PgConnection,
        wallet_id: Uuid,
        asset_type_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(
                CASE entry_type WHEN 'CREDIT' THEN amount ELSE -amount END
            ), 0)::BIGINT AS balance
            FROM ledger_entries
            WHERE wallet_id = $1 AND asset_type_id = $2
            "#,
        )
        .bind(wallet_id)
        .bind(asset_type_id)
        .fetch_one(conn)
        .await?;

        Ok(row.get("balance"))
    }

    /// Per-asset balances across all of a user's wallets, optionally filtered
    /// by asset code, sorted by code. Wallets with no entries report zero.
    pub async fn user_balances(
        pool: &PgPool,
        user_id: Uuid,
        asset_code: Option<&str>,
    ) -> Result<Vec<AssetBalance>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT a.code, a.name,
                   COALESCE(SUM(
                       CASE e.entry_type WHEN 'CREDIT' THEN e.amount
                                         WHEN 'DEBIT' THEN -e.amount
                       END
                   ), 0)::BIGINT AS balance
            FROM wallets w
            JOIN asset_types a ON a.id = w.asset_type_id
            LEFT JOIN ledger_entries e
                   ON e.wallet_id = w.id AND e.asset_type_id = w.asset_type_id
            WHERE w.owner_type = 'USER'
              AND w.user_id = $1
              AND ($2::TEXT IS NULL OR a.code = $2)
            GROUP BY a.code, a.name
            ORDER BY a.code ASC
            "#,
        )
        .bind(user_id)
        .bind(asset_code)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| AssetBalance {
                asset_code: r.get("code"),
                asset_name: r.get("name"),
                balance: r.get("balance"),
            })
            .collect())
    }
}
