/// Membership model and database operations
///
/// A membership grants a user a role inside one agency.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_role AS ENUM ('owner', 'admin', 'member', 'viewer');
///
/// CREATE TABLE user_agency_memberships (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     agency_id UUID NOT NULL REFERENCES agencies(id) ON DELETE CASCADE,
///     role membership_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT user_agency_memberships_user_agency_key UNIQUE (user_id, agency_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: Full control of the agency
/// - **admin**: Manages caregivers and members
/// - **member**: Works with caregiver records
/// - **viewer**: Read-only access

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Roles a user can hold within an agency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Full control of the agency
    Owner,

    /// Manages caregivers and members
    Admin,

    /// Works with caregiver records
    Member,

    /// Read-only access
    Viewer,
}

impl MembershipRole {
    /// Converts role to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
            MembershipRole::Viewer => "viewer",
        }
    }
}

impl fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership linking a user to an agency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Membership ID
    pub id: Uuid,

    /// Identity provider subject of the member
    pub user_id: String,

    /// Agency the member acts within
    pub agency_id: Uuid,

    /// Role within the agency
    pub role: MembershipRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Member's subject identifier
    pub user_id: String,

    /// Agency ID
    pub agency_id: Uuid,

    /// Role to assign
    pub role: MembershipRole,
}

impl Membership {
    /// Finds the membership for a given user and agency
    pub async fn find(
        pool: &PgPool,
        user_id: &str,
        agency_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, user_id, agency_id, role, created_at
            FROM user_agency_memberships
            WHERE user_id = $1 AND agency_id = $2
            "#,
        )
        .bind(user_id)
        .bind(agency_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Returns the user's earliest membership, if any
    ///
    /// Ordering by creation time keeps the choice stable when a user holds
    /// more than one membership.
    pub async fn first_for_user(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, user_id, agency_id, role, created_at
            FROM user_agency_memberships
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Lists all memberships of a user, oldest first
    pub async fn list_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, user_id, agency_id, role, created_at
            FROM user_agency_memberships
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Returns the membership for `(user_id, agency_id)`, creating it if needed
    ///
    /// An existing membership is returned unchanged; its role is never
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the user or agency does not exist (foreign key
    /// violation) or the database is unreachable.
    pub async fn ensure(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let inserted = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO user_agency_memberships (user_id, agency_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, agency_id) DO NOTHING
            RETURNING id, user_id, agency_id, role, created_at
            "#,
        )
        .bind(&data.user_id)
        .bind(data.agency_id)
        .bind(data.role)
        .fetch_optional(pool)
        .await?;

        if let Some(membership) = inserted {
            debug!(
                user_id = %membership.user_id,
                agency_id = %membership.agency_id,
                role = %membership.role,
                "Created membership"
            );
            return Ok(membership);
        }

        Self::find(pool, &data.user_id, data.agency_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
