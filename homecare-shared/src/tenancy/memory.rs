/// In-memory store
///
/// Implements [`TenancyStore`] and [`CaregiverStore`] over plain collections
/// with the same observable rules as the PostgreSQL schema: agency names are
/// unique, `(user_id, agency_id)` memberships are unique, memberships require
/// an existing user and agency, and caregivers list newest first.
///
/// Every trait call counts as one query, and a failure can be queued for any
/// operation, which makes the store useful for exercising error paths.
///
/// # Example
///
/// ```
/// use homecare_shared::tenancy::{InMemoryStore, StoreOperation, TenancyStore};
///
/// # async fn example() {
/// let store = InMemoryStore::new();
/// store.fail_next(StoreOperation::UpsertUser, "connection refused");
///
/// assert!(store.upsert_user("u1", "u1@example.local").await.is_err());
/// assert!(store.upsert_user("u1", "u1@example.local").await.is_ok());
/// assert_eq!(store.query_count(), 2);
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::store::{CaregiverStore, StoreError, StoreResult, TenancyStore};
use crate::models::{
    agency::Agency,
    caregiver::{Caregiver, CreateCaregiver},
    membership::{CreateMembership, Membership},
    user::User,
};

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    FirstMembership,
    FindOrCreateAgency,
    UpsertUser,
    EnsureMembership,
    ListCaregivers,
    CreateCaregiver,
}

#[derive(Debug)]
struct StoredCaregiver {
    agency_id: Uuid,
    created_at: DateTime<Utc>,
    caregiver: Caregiver,
}

#[derive(Debug, Default)]
struct State {
    agencies: Vec<Agency>,
    users: HashMap<String, User>,
    memberships: Vec<Membership>,
    caregivers: Vec<StoredCaregiver>,
    failures: HashMap<StoreOperation, String>,
}

/// Store keeping everything in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    queries: AtomicUsize,
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `operation` fail with `message`
    pub fn fail_next(&self, operation: StoreOperation, message: impl Into<String>) {
        self.lock().failures.insert(operation, message.into());
    }

    /// Number of store calls served so far, failed ones included
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Snapshot of all agencies
    pub fn agencies(&self) -> Vec<Agency> {
        self.lock().agencies.clone()
    }

    /// Snapshot of a user row
    pub fn user(&self, user_id: &str) -> Option<User> {
        self.lock().users.get(user_id).cloned()
    }

    /// Snapshot of a user's memberships, oldest first
    pub fn memberships_of(&self, user_id: &str) -> Vec<Membership> {
        self.lock()
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every mutation is a single push or insert, so a poisoned lock
        // still guards consistent data.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Counts the query and returns the state, or the queued failure
    fn begin(&self, operation: StoreOperation) -> StoreResult<MutexGuard<'_, State>> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let mut state = self.lock();
        match state.failures.remove(&operation) {
            Some(message) => Err(StoreError::Backend(message)),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl TenancyStore for InMemoryStore {
    async fn first_membership(&self, user_id: &str) -> StoreResult<Option<Membership>> {
        let state = self.begin(StoreOperation::FirstMembership)?;

        Ok(state
            .memberships
            .iter()
            .find(|m| m.user_id == user_id)
            .cloned())
    }

    async fn find_or_create_agency(&self, name: &str) -> StoreResult<Agency> {
        let mut state = self.begin(StoreOperation::FindOrCreateAgency)?;

        if let Some(agency) = state.agencies.iter().find(|a| a.name == name) {
            return Ok(agency.clone());
        }

        let agency = Agency {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.agencies.push(agency.clone());
        Ok(agency)
    }

    async fn upsert_user(&self, user_id: &str, email: &str) -> StoreResult<User> {
        let mut state = self.begin(StoreOperation::UpsertUser)?;
        let now = Utc::now();

        let user = state
            .users
            .entry(user_id.to_string())
            .and_modify(|user| {
                user.email = email.to_string();
                user.updated_at = now;
            })
            .or_insert_with(|| User {
                id: user_id.to_string(),
                email: email.to_string(),
                created_at: now,
                updated_at: now,
            });

        Ok(user.clone())
    }

    async fn ensure_membership(&self, data: CreateMembership) -> StoreResult<Membership> {
        let mut state = self.begin(StoreOperation::EnsureMembership)?;

        if let Some(existing) = state
            .memberships
            .iter()
            .find(|m| m.user_id == data.user_id && m.agency_id == data.agency_id)
        {
            return Ok(existing.clone());
        }

        if !state.users.contains_key(&data.user_id) {
            return Err(StoreError::Backend(format!(
                "membership references unknown user {}",
                data.user_id
            )));
        }
        if !state.agencies.iter().any(|a| a.id == data.agency_id) {
            return Err(StoreError::Backend(format!(
                "membership references unknown agency {}",
                data.agency_id
            )));
        }

        let membership = Membership {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            agency_id: data.agency_id,
            role: data.role,
            created_at: Utc::now(),
        };
        state.memberships.push(membership.clone());
        Ok(membership)
    }
}

#[async_trait]
impl CaregiverStore for InMemoryStore {
    async fn list_caregivers(&self, agency_id: Uuid) -> StoreResult<Vec<Caregiver>> {
        let state = self.begin(StoreOperation::ListCaregivers)?;

        let mut rows: Vec<&StoredCaregiver> = state
            .caregivers
            .iter()
            .filter(|c| c.agency_id == agency_id)
            .collect();
        // Stable sort keeps later inserts first on equal timestamps once reversed.
        rows.sort_by_key(|c| c.created_at);
        Ok(rows.into_iter().rev().map(|c| c.caregiver.clone()).collect())
    }

    async fn create_caregiver(&self, data: CreateCaregiver) -> StoreResult<Caregiver> {
        let mut state = self.begin(StoreOperation::CreateCaregiver)?;

        if !state.agencies.iter().any(|a| a.id == data.agency_id) {
            return Err(StoreError::Backend(format!(
                "caregiver references unknown agency {}",
                data.agency_id
            )));
        }

        let caregiver = Caregiver {
            id: Uuid::new_v4(),
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            phone: data.phone,
            status: Some(data.status.as_str().to_string()),
            max_weekly_hours: data.max_weekly_hours,
            preferred_hours_per_week: data.preferred_hours_per_week,
        };
        state.caregivers.push(StoredCaregiver {
            agency_id: data.agency_id,
            created_at: Utc::now(),
            caregiver: caregiver.clone(),
        });
        Ok(caregiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::caregiver::CaregiverStatus;
    use crate::models::membership::MembershipRole;

    fn new_caregiver(agency_id: Uuid, first_name: &str) -> CreateCaregiver {
        CreateCaregiver {
            agency_id,
            first_name: Some(first_name.to_string()),
            last_name: None,
            email: None,
            phone: None,
            max_weekly_hours: None,
            preferred_hours_per_week: None,
            status: CaregiverStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_agency_names_are_unique() {
        let store = InMemoryStore::new();

        let first = store.find_or_create_agency("Demo Agency").await.unwrap();
        let second = store.find_or_create_agency("Demo Agency").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.agencies().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_user_refreshes_email() {
        let store = InMemoryStore::new();

        store.upsert_user("u1", "old@example.com").await.unwrap();
        let user = store.upsert_user("u1", "new@example.com").await.unwrap();

        assert_eq!(user.email, "new@example.com");
        assert_eq!(store.user("u1").unwrap().email, "new@example.com");
    }

    #[tokio::test]
    async fn test_membership_requires_existing_user() {
        let store = InMemoryStore::new();
        let agency = store.find_or_create_agency("Demo Agency").await.unwrap();

        let result = store
            .ensure_membership(CreateMembership {
                user_id: "ghost".to_string(),
                agency_id: agency.id,
                role: MembershipRole::Admin,
            })
            .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_queued_failure_applies_once() {
        let store = InMemoryStore::new();
        store.fail_next(StoreOperation::FindOrCreateAgency, "disk full");

        let err = store.find_or_create_agency("Demo Agency").await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(store.find_or_create_agency("Demo Agency").await.is_ok());
        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_caregivers_scoped_and_newest_first() {
        let store = InMemoryStore::new();
        let ours = store.find_or_create_agency("Ours").await.unwrap();
        let theirs = store.find_or_create_agency("Theirs").await.unwrap();

        store.create_caregiver(new_caregiver(ours.id, "Ann")).await.unwrap();
        store.create_caregiver(new_caregiver(theirs.id, "Bob")).await.unwrap();
        store.create_caregiver(new_caregiver(ours.id, "Cat")).await.unwrap();

        let names: Vec<Option<String>> = store
            .list_caregivers(ours.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.first_name)
            .collect();

        assert_eq!(names, vec![Some("Cat".to_string()), Some("Ann".to_string())]);
    }
}
