/// Caregiver model and database operations
///
/// Caregivers are plain roster records scoped to an agency. Every descriptive
/// field is optional; nothing is validated on the way in.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE caregivers (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     agency_id UUID NOT NULL REFERENCES agencies(id) ON DELETE CASCADE,
///     first_name VARCHAR(255),
///     last_name VARCHAR(255),
///     email VARCHAR(320),
///     phone VARCHAR(64),
///     status VARCHAR(32) DEFAULT 'active',
///     max_weekly_hours DOUBLE PRECISION,
///     preferred_hours_per_week DOUBLE PRECISION,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Roster status of a caregiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaregiverStatus {
    /// Available for scheduling
    Active,
}

impl CaregiverStatus {
    /// Converts status to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            CaregiverStatus::Active => "active",
        }
    }
}

/// Caregiver row as returned to clients
///
/// `agency_id` and `created_at` are not part of the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Caregiver {
    /// Caregiver ID
    pub id: Uuid,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub email: Option<String>,

    pub phone: Option<String>,

    /// Roster status, `"active"` for newly created caregivers
    pub status: Option<String>,

    /// Hard upper bound on weekly hours
    pub max_weekly_hours: Option<f64>,

    /// Hours per week the caregiver would like to work
    pub preferred_hours_per_week: Option<f64>,
}

/// Input for creating a caregiver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCaregiver {
    /// Owning agency
    pub agency_id: Uuid,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub email: Option<String>,

    pub phone: Option<String>,

    pub max_weekly_hours: Option<f64>,

    pub preferred_hours_per_week: Option<f64>,

    /// Initial status
    pub status: CaregiverStatus,
}

impl Caregiver {
    /// Lists an agency's caregivers, newest first
    pub async fn list_by_agency(pool: &PgPool, agency_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let caregivers = sqlx::query_as::<_, Caregiver>(
            r#"
            SELECT id, first_name, last_name, email, phone, status,
                   max_weekly_hours, preferred_hours_per_week
            FROM caregivers
            WHERE agency_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(agency_id)
        .fetch_all(pool)
        .await?;

        Ok(caregivers)
    }

    /// Creates a caregiver in the given agency
    pub async fn create(pool: &PgPool, data: CreateCaregiver) -> Result<Self, sqlx::Error> {
        let caregiver = sqlx::query_as::<_, Caregiver>(
            r#"
            INSERT INTO caregivers (agency_id, first_name, last_name, email, phone,
                                    status, max_weekly_hours, preferred_hours_per_week)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, first_name, last_name, email, phone, status,
                      max_weekly_hours, preferred_hours_per_week
            "#,
        )
        .bind(data.agency_id)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.status.as_str())
        .bind(data.max_weekly_hours)
        .bind(data.preferred_hours_per_week)
        .fetch_one(pool)
        .await?;

        Ok(caregiver)
    }
}
