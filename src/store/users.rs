//! User lookups

use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::models::User;

pub struct UserRepository;

impl UserRepository {
    pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(r#"SELECT id, email, created_at FROM users WHERE id = $1"#)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| User {
            id: r.get("id"),
            email: r.get("email"),
            created_at: r.get("created_at"),
        }))
    }
}
