/// Tenant resolution
///
/// Every tenant-scoped route starts with [`TenantResolver::require_current_agency`]:
///
/// ```text
/// request headers
///   └─> SessionResolver ──(no session)──> TenantError::Unauthenticated
///         └─> first membership ──(none)──> TenantError::NoTenant
///               └─> AgencyContext { user_id, agency_id }
/// ```
///
/// Resolution performs at most one read and never writes.

use axum::http::HeaderMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::store::{StoreError, TenancyStore};
use crate::auth::session::{Identity, SessionResolver};

/// The agency a caller acts within
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencyContext {
    /// Caller's subject identifier
    pub user_id: String,

    /// Agency every downstream query is scoped to
    pub agency_id: Uuid,
}

/// Error type for tenant resolution
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    /// No session could be resolved
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Authenticated, but no membership has been provisioned
    #[error("No agency membership found for current user")]
    NoTenant,

    /// Membership lookup failed
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Resolves callers to their agency
#[derive(Clone)]
pub struct TenantResolver {
    sessions: Arc<dyn SessionResolver>,
    store: Arc<dyn TenancyStore>,
}

impl TenantResolver {
    pub fn new(sessions: Arc<dyn SessionResolver>, store: Arc<dyn TenancyStore>) -> Self {
        Self { sessions, store }
    }

    /// Resolves the request's caller and the agency they may act within
    ///
    /// # Errors
    ///
    /// - [`TenantError::Unauthenticated`] when there is no session; no query
    ///   is issued in that case
    /// - [`TenantError::NoTenant`] when the caller has no membership
    /// - [`TenantError::Store`] when the membership lookup fails
    pub async fn require_current_agency(
        &self,
        headers: &HeaderMap,
    ) -> Result<AgencyContext, TenantError> {
        let identity = self
            .sessions
            .resolve(headers)
            .await
            .ok_or(TenantError::Unauthenticated)?;

        self.agency_for(&identity).await
    }

    /// Resolves the agency of an already-verified identity
    pub async fn agency_for(&self, identity: &Identity) -> Result<AgencyContext, TenantError> {
        let membership = self
            .store
            .first_membership(&identity.user_id)
            .await?
            .ok_or(TenantError::NoTenant)?;

        debug!(
            user_id = %identity.user_id,
            agency_id = %membership.agency_id,
            role = %membership.role,
            "Resolved agency"
        );

        Ok(AgencyContext {
            user_id: identity.user_id.clone(),
            agency_id: membership.agency_id,
        })
    }
}
