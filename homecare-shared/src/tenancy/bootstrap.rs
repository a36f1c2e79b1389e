/// First-login provisioning
///
/// [`Bootstrapper::bootstrap`] makes sure an authenticated identity has a
/// user row, an agency and an admin membership:
///
/// 1. Resolve the session (fail fast with `Unauthenticated`)
/// 2. Derive a display email
/// 3. Find or create the agency picked by the provisioning policy
/// 4. Upsert the user row
/// 5. Find or create the membership
///
/// The writes are not wrapped in a transaction. Each step is idempotent on
/// its own, so calling the bootstrapper again after a partial failure
/// converges to the same end state.

use axum::http::HeaderMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::policy::ProvisioningPolicy;
use super::store::{StoreError, TenancyStore};
use crate::auth::session::{Identity, SessionResolver};
use crate::models::membership::{CreateMembership, MembershipRole};

/// Domain of the placeholder address used when a profile has no email
pub const PLACEHOLDER_EMAIL_DOMAIN: &str = "example.local";

/// Result of a successful bootstrap
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapOutcome {
    pub user_id: String,
    pub email: String,
    pub agency_id: Uuid,
}

/// Error type for bootstrap
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// No session could be resolved
    #[error("Unauthenticated")]
    Unauthenticated,

    /// A provisioning write failed
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Picks the email to store for an identity
///
/// The primary address, else the first listed address, else
/// `{user_id}@example.local`. An empty address counts as missing; later
/// listed addresses are never consulted. Addresses are stored as given.
pub fn derive_display_email(identity: &Identity) -> String {
    identity
        .primary_email
        .as_deref()
        .filter(|email| !email.is_empty())
        .or_else(|| {
            identity
                .email_addresses
                .first()
                .map(String::as_str)
                .filter(|email| !email.is_empty())
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}@{}", identity.user_id, PLACEHOLDER_EMAIL_DOMAIN))
}

/// Provisions agency, user and membership for new identities
#[derive(Clone)]
pub struct Bootstrapper {
    sessions: Arc<dyn SessionResolver>,
    store: Arc<dyn TenancyStore>,
    policy: Arc<dyn ProvisioningPolicy>,
}

impl Bootstrapper {
    pub fn new(
        sessions: Arc<dyn SessionResolver>,
        store: Arc<dyn TenancyStore>,
        policy: Arc<dyn ProvisioningPolicy>,
    ) -> Self {
        Self {
            sessions,
            store,
            policy,
        }
    }

    /// Resolves the request's caller and provisions them
    ///
    /// # Errors
    ///
    /// - [`BootstrapError::Unauthenticated`] when there is no session
    /// - [`BootstrapError::Store`] when any write fails; earlier writes are
    ///   kept
    pub async fn bootstrap(&self, headers: &HeaderMap) -> Result<BootstrapOutcome, BootstrapError> {
        let identity = self
            .sessions
            .resolve(headers)
            .await
            .ok_or(BootstrapError::Unauthenticated)?;

        Ok(self.provision(&identity).await?)
    }

    /// Provisions an already-verified identity
    pub async fn provision(&self, identity: &Identity) -> Result<BootstrapOutcome, StoreError> {
        let email = derive_display_email(identity);
        let placement = self.policy.placement_for(identity);

        let result = self
            .run_steps(identity, &email, &placement.agency_name, placement.role)
            .await;

        match &result {
            Ok(outcome) => info!(
                user_id = %outcome.user_id,
                agency_id = %outcome.agency_id,
                policy = self.policy.name(),
                "Bootstrapped identity"
            ),
            Err(e) => warn!(
                user_id = %identity.user_id,
                policy = self.policy.name(),
                error = %e,
                "Bootstrap failed"
            ),
        }

        result
    }

    async fn run_steps(
        &self,
        identity: &Identity,
        email: &str,
        agency_name: &str,
        role: MembershipRole,
    ) -> Result<BootstrapOutcome, StoreError> {
        let agency = self.store.find_or_create_agency(agency_name).await?;

        self.store.upsert_user(&identity.user_id, email).await?;

        self.store
            .ensure_membership(CreateMembership {
                user_id: identity.user_id.clone(),
                agency_id: agency.id,
                role,
            })
            .await?;

        Ok(BootstrapOutcome {
            user_id: identity.user_id.clone(),
            email: email.to_string(),
            agency_id: agency.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_session_token, SessionClaims};
    use crate::auth::session::BearerSessionResolver;
    use crate::tenancy::memory::{InMemoryStore, StoreOperation};
    use crate::tenancy::policy::{PersonalAgencyPolicy, SharedAgencyPolicy, DEFAULT_AGENCY_NAME};
    use axum::http::{header, HeaderValue};

    const SECRET: &str = "test-session-secret-at-least-32-bytes!";

    fn bootstrapper(store: Arc<InMemoryStore>) -> Bootstrapper {
        Bootstrapper::new(
            Arc::new(BearerSessionResolver::new(SECRET)),
            store,
            Arc::new(SharedAgencyPolicy::default()),
        )
    }

    fn session_headers(claims: SessionClaims) -> HeaderMap {
        let token = create_session_token(&claims, SECRET).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_email_prefers_primary_address() {
        let identity = Identity {
            user_id: "u1".to_string(),
            primary_email: Some("primary@example.com".to_string()),
            email_addresses: vec!["other@example.com".to_string()],
        };
        assert_eq!(derive_display_email(&identity), "primary@example.com");
    }

    #[test]
    fn test_email_falls_back_to_listed_address() {
        let identity = Identity {
            user_id: "u1".to_string(),
            primary_email: None,
            email_addresses: vec![
                "secondary@example.com".to_string(),
                "third@example.com".to_string(),
            ],
        };
        assert_eq!(derive_display_email(&identity), "secondary@example.com");
    }

    #[test]
    fn test_email_placeholder_contains_user_id() {
        assert_eq!(derive_display_email(&Identity::new("u1")), "u1@example.local");
    }

    #[test]
    fn test_empty_primary_email_falls_through() {
        let identity = Identity {
            user_id: "u1".to_string(),
            primary_email: Some(String::new()),
            email_addresses: vec!["listed@example.com".to_string()],
        };
        assert_eq!(derive_display_email(&identity), "listed@example.com");
    }

    #[test]
    fn test_only_first_listed_address_is_considered() {
        let identity = Identity {
            user_id: "u1".to_string(),
            primary_email: None,
            email_addresses: vec![String::new(), "second@example.com".to_string()],
        };
        assert_eq!(derive_display_email(&identity), "u1@example.local");
    }

    #[test]
    fn test_email_is_stored_as_given() {
        let identity = Identity {
            user_id: "u1".to_string(),
            primary_email: Some(" Nurse@Example.com ".to_string()),
            email_addresses: Vec::new(),
        };
        assert_eq!(derive_display_email(&identity), " Nurse@Example.com ");
    }

    #[tokio::test]
    async fn test_bootstrap_without_session_touches_nothing() {
        let store = Arc::new(InMemoryStore::new());

        let result = bootstrapper(store.clone()).bootstrap(&HeaderMap::new()).await;

        assert!(matches!(result, Err(BootstrapError::Unauthenticated)));
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_provisions_admin_membership() {
        let store = Arc::new(InMemoryStore::new());

        let outcome = bootstrapper(store.clone())
            .bootstrap(&session_headers(SessionClaims::new("u1")))
            .await
            .unwrap();

        assert_eq!(outcome.user_id, "u1");
        assert_eq!(outcome.email, "u1@example.local");

        let agencies = store.agencies();
        assert_eq!(agencies.len(), 1);
        assert_eq!(agencies[0].name, DEFAULT_AGENCY_NAME);
        assert_eq!(agencies[0].id, outcome.agency_id);

        let memberships = store.memberships_of("u1");
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].role, MembershipRole::Admin);
        assert_eq!(store.user("u1").unwrap().email, "u1@example.local");
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let bootstrapper = bootstrapper(store.clone());
        let headers = session_headers(SessionClaims::new("u1").with_email("u1@agency.test"));

        let first = bootstrapper.bootstrap(&headers).await.unwrap();
        let second = bootstrapper.bootstrap(&headers).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.agencies().len(), 1);
        assert_eq!(store.memberships_of("u1").len(), 1);
    }

    #[tokio::test]
    async fn test_shared_policy_puts_users_in_same_agency() {
        let store = Arc::new(InMemoryStore::new());
        let bootstrapper = bootstrapper(store.clone());

        let a = bootstrapper.provision(&Identity::new("u1")).await.unwrap();
        let b = bootstrapper.provision(&Identity::new("u2")).await.unwrap();

        assert_eq!(a.agency_id, b.agency_id);
        assert_eq!(store.agencies().len(), 1);
    }

    #[tokio::test]
    async fn test_personal_policy_separates_users() {
        let store = Arc::new(InMemoryStore::new());
        let bootstrapper = Bootstrapper::new(
            Arc::new(BearerSessionResolver::new(SECRET)),
            store.clone(),
            Arc::new(PersonalAgencyPolicy),
        );

        let a = bootstrapper.provision(&Identity::new("u1")).await.unwrap();
        let b = bootstrapper.provision(&Identity::new("u2")).await.unwrap();

        assert_ne!(a.agency_id, b.agency_id);
        assert_eq!(store.agencies().len(), 2);
    }

    #[tokio::test]
    async fn test_retry_after_partial_failure_converges() {
        let store = Arc::new(InMemoryStore::new());
        let bootstrapper = bootstrapper(store.clone());
        store.fail_next(StoreOperation::EnsureMembership, "deadlock detected");

        let err = bootstrapper.provision(&Identity::new("u1")).await.unwrap_err();
        assert_eq!(err.to_string(), "deadlock detected");
        // Agency and user writes from the failed attempt remain.
        assert_eq!(store.agencies().len(), 1);
        assert!(store.user("u1").is_some());
        assert!(store.memberships_of("u1").is_empty());

        let outcome = bootstrapper.provision(&Identity::new("u1")).await.unwrap();
        assert_eq!(outcome.agency_id, store.agencies()[0].id);
        assert_eq!(store.memberships_of("u1").len(), 1);
    }

    #[tokio::test]
    async fn test_agency_failure_aborts_before_user_write() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_next(StoreOperation::FindOrCreateAgency, "connection refused");

        let result = bootstrapper(store.clone())
            .bootstrap(&session_headers(SessionClaims::new("u1")))
            .await;

        assert!(matches!(result, Err(BootstrapError::Store(_))));
        assert!(store.user("u1").is_none());
    }
}
