/// Agency model and database operations
///
/// Agencies are the tenant boundary: every caregiver and membership belongs
/// to exactly one agency.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE agencies (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT agencies_name_key UNIQUE (name)
/// );
/// ```
///
/// The unique name constraint is what makes [`Agency::find_or_create`] safe
/// under concurrent first logins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Agency (tenant) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Agency {
    /// Unique agency ID (UUID v4)
    pub id: Uuid,

    /// Display name, unique across agencies
    pub name: String,

    /// When the agency was created
    pub created_at: DateTime<Utc>,
}

impl Agency {
    /// Finds an agency by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let agency = sqlx::query_as::<_, Agency>(
            r#"
            SELECT id, name, created_at
            FROM agencies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(agency)
    }

    /// Finds an agency by its exact name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let agency = sqlx::query_as::<_, Agency>(
            r#"
            SELECT id, name, created_at
            FROM agencies
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(agency)
    }

    /// Returns the agency with the given name, creating it if needed
    ///
    /// Runs `INSERT ... ON CONFLICT DO NOTHING` and, when another request won
    /// the insert, re-reads the existing row in a separate statement so the
    /// committed row is visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable, or
    /// `sqlx::Error::RowNotFound` if the row vanished between the two
    /// statements.
    pub async fn find_or_create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        let inserted = sqlx::query_as::<_, Agency>(
            r#"
            INSERT INTO agencies (name)
            VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        if let Some(agency) = inserted {
            debug!(agency_id = %agency.id, name, "Created agency");
            return Ok(agency);
        }

        Self::find_by_name(pool, name)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
