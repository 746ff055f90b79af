//! Wallet lookups, ordered row locks, and conditional version bumps

use sqlx::postgres::PgConnection;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::models::{OwnerType, Wallet};

/// (id, version) pair returned by the row-lock query.
#[derive(Debug, Clone, Copy)]
pub struct LockedWallet {
    pub id: Uuid,
    pub version: i64,
}

pub struct WalletRepository;

impl WalletRepository {
    pub async fn get_user_wallet(
        pool: &PgPool,
        user_id: Uuid,
        asset_type_id: Uuid,
    ) -> Result<Option<Wallet>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT id, owner_type, user_id, system_code, asset_type_id, version
               FROM wallets
               WHERE owner_type = 'USER' AND user_id = $1 AND asset_type_id = $2"#,
        )
        .bind(user_id)
        .bind(asset_type_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_wallet))
    }

    pub async fn get_system_wallet(
        pool: &PgPool,
        system_code: &str,
        asset_type_id: Uuid,
    ) -> Result<Option<Wallet>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT id, owner_type, user_id, system_code, asset_type_id, version
               FROM wallets
               WHERE owner_type = 'SYSTEM' AND system_code = $1 AND asset_type_id = $2"#,
        )
        .bind(system_code)
        .bind(asset_type_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_wallet))
    }

    /// Row-lock the given wallets until transaction end.
    ///
    /// `ORDER BY id` fixes the lock-acquisition order; every transaction
    /// locking wallet rows must go through this query.
    pub async fn lock_rows(
        conn: &mut PgConnection,
        wallet_ids: &[Uuid],
    ) -> Result<Vec<LockedWallet>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT id, version FROM wallets
               WHERE id = ANY($1)
               ORDER BY id ASC
               FOR UPDATE"#,
        )
        .bind(wallet_ids)
        .fetch_all(conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LockedWallet {
                id: r.get("id"),
                version: r.get("version"),
            })
            .collect())
    }

    /// Conditional version bump. Returns the number of rows updated (0 or 1);
    /// 0 means a concurrent writer advanced the version first.
    pub async fn bump_version(
        conn: &mut PgConnection,
        wallet_id: Uuid,
        expected_version: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE wallets SET version = version + 1, updated_at = NOW()
               WHERE id = $1 AND version = $2"#,
        )
        .bind(wallet_id)
        .bind(expected_version)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    fn row_to_wallet(r: sqlx::postgres::PgRow) -> Wallet {
        let owner_type: String = r.get("owner_type");
        Wallet {
            id: r.get("id"),
            // The check constraint admits only USER / SYSTEM
            owner_type: OwnerType::from_str(&owner_type).unwrap_or(OwnerType::System),
            user_id: r.get("user_id"),
            system_code: r.get("system_code"),
            asset_type_id: r.get("asset_type_id"),
            version: r.get("version"),
        }
    }
}
