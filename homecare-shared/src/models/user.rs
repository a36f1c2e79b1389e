/// User model and database operations
///
/// Users are not registered through this service. A row is written the first
/// time an identity calls the bootstrap endpoint, keyed by the identity
/// provider's subject identifier.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id TEXT PRIMARY KEY,
///     email VARCHAR(320) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// User record mirrored from the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Identity provider subject identifier
    pub id: String,

    /// Display email derived at bootstrap time
    pub email: String,

    /// When the user row was first written
    pub created_at: DateTime<Utc>,

    /// When the user row was last upserted
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Finds a user by subject identifier
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Inserts the user or refreshes its email if the ID already exists
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `id` - Identity provider subject identifier
    /// * `email` - Display email to store
    ///
    /// # Returns
    ///
    /// The stored user row
    pub async fn upsert(pool: &PgPool, id: &str, email: &str) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                updated_at = NOW()
            RETURNING id, email, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }
}
