/// Storage seams for tenancy and caregiver data
///
/// The tenant resolver, bootstrapper and caregiver routes talk to storage
/// through these traits. [`PgStore`] is the PostgreSQL implementation backed
/// by the `models` queries; [`InMemoryStore`](super::memory::InMemoryStore)
/// backs tests and local demos.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    agency::Agency,
    caregiver::{Caregiver, CreateCaregiver},
    membership::{CreateMembership, Membership},
    user::User,
};

/// Error raised by a storage backend
///
/// The display form is the backend's own message, unmodified.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// PostgreSQL error
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    /// Any other backend failure
    #[error("{0}")]
    Backend(String),
}

/// Storage result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Agencies, users and memberships
#[async_trait]
pub trait TenancyStore: Send + Sync {
    /// Returns the user's first membership, or `None` if there is none
    async fn first_membership(&self, user_id: &str) -> StoreResult<Option<Membership>>;

    /// Returns the agency named `name`, creating it if it doesn't exist
    async fn find_or_create_agency(&self, name: &str) -> StoreResult<Agency>;

    /// Inserts the user or refreshes its email
    async fn upsert_user(&self, user_id: &str, email: &str) -> StoreResult<User>;

    /// Returns the membership for the user and agency, creating it if needed
    async fn ensure_membership(&self, data: CreateMembership) -> StoreResult<Membership>;
}

/// Caregiver roster
#[async_trait]
pub trait CaregiverStore: Send + Sync {
    /// Lists an agency's caregivers, newest first
    async fn list_caregivers(&self, agency_id: Uuid) -> StoreResult<Vec<Caregiver>>;

    /// Creates a caregiver
    async fn create_caregiver(&self, data: CreateCaregiver) -> StoreResult<Caregiver>;
}

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TenancyStore for PgStore {
    async fn first_membership(&self, user_id: &str) -> StoreResult<Option<Membership>> {
        Ok(Membership::first_for_user(&self.pool, user_id).await?)
    }

    async fn find_or_create_agency(&self, name: &str) -> StoreResult<Agency> {
        Ok(Agency::find_or_create(&self.pool, name).await?)
    }

    async fn upsert_user(&self, user_id: &str, email: &str) -> StoreResult<User> {
        Ok(User::upsert(&self.pool, user_id, email).await?)
    }

    async fn ensure_membership(&self, data: CreateMembership) -> StoreResult<Membership> {
        Ok(Membership::ensure(&self.pool, data).await?)
    }
}

#[async_trait]
impl CaregiverStore for PgStore {
    async fn list_caregivers(&self, agency_id: Uuid) -> StoreResult<Vec<Caregiver>> {
        Ok(Caregiver::list_by_agency(&self.pool, agency_id).await?)
    }

    async fn create_caregiver(&self, data: CreateCaregiver) -> StoreResult<Caregiver> {
        Ok(Caregiver::create(&self.pool, data).await?)
    }
}
