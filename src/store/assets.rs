//! Asset type lookups

use sqlx::{PgPool, Row};

use super::models::AssetType;

pub struct AssetTypeRepository;

impl AssetTypeRepository {
    /// Look up an asset type by its code. The caller passes the code already
    /// uppercased; codes are stored uppercase by constraint.
    pub async fn get_by_code(pool: &PgPool, code: &str) -> Result<Option<AssetType>, sqlx::Error> {
        let row = sqlx::query(r#"SELECT id, code, name FROM asset_types WHERE code = $1"#)
            .bind(code)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| AssetType {
            id: r.get("id"),
            code: r.get("code"),
            name: r.get("name"),
        }))
    }
}
