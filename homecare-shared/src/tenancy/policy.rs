/// Tenant provisioning policies
///
/// A [`ProvisioningPolicy`] decides which agency a newly bootstrapped
/// identity joins and with which role. The bootstrapper never hardcodes an
/// agency; it asks the policy.
///
/// # Policies
///
/// - [`SharedAgencyPolicy`]: everyone joins one named agency (default
///   `"Demo Agency"`)
/// - [`PersonalAgencyPolicy`]: every identity gets an agency of its own

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::auth::session::Identity;
use crate::models::membership::MembershipRole;

/// Name of the agency shared by all identities under the default policy
pub const DEFAULT_AGENCY_NAME: &str = "Demo Agency";

/// Where a new identity lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Name of the agency to find or create
    pub agency_name: String,

    /// Role granted by the new membership
    pub role: MembershipRole,
}

/// Chooses the agency and role for an identity being bootstrapped
pub trait ProvisioningPolicy: Send + Sync {
    /// Short policy name for logs
    fn name(&self) -> &'static str;

    /// Placement for `identity`; must be deterministic per identity
    fn placement_for(&self, identity: &Identity) -> Placement;
}

/// Every identity joins the same named agency as admin
#[derive(Debug, Clone)]
pub struct SharedAgencyPolicy {
    agency_name: String,
}

impl SharedAgencyPolicy {
    pub fn new(agency_name: impl Into<String>) -> Self {
        Self {
            agency_name: agency_name.into(),
        }
    }
}

impl Default for SharedAgencyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AGENCY_NAME)
    }
}

impl ProvisioningPolicy for SharedAgencyPolicy {
    fn name(&self) -> &'static str {
        "shared"
    }

    fn placement_for(&self, _identity: &Identity) -> Placement {
        Placement {
            agency_name: self.agency_name.clone(),
            role: MembershipRole::Admin,
        }
    }
}

/// Every identity gets its own agency, named after its subject ID
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonalAgencyPolicy;

impl ProvisioningPolicy for PersonalAgencyPolicy {
    fn name(&self) -> &'static str {
        "personal"
    }

    fn placement_for(&self, identity: &Identity) -> Placement {
        Placement {
            agency_name: format!("{}'s Agency", identity.user_id),
            role: MembershipRole::Admin,
        }
    }
}

/// Policy selector as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisioningMode {
    /// [`SharedAgencyPolicy`]
    #[default]
    Shared,

    /// [`PersonalAgencyPolicy`]
    Personal,
}

impl FromStr for ProvisioningMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(ProvisioningMode::Shared),
            "personal" => Ok(ProvisioningMode::Personal),
            other => Err(format!(
                "unknown provisioning mode '{}', expected 'shared' or 'personal'",
                other
            )),
        }
    }
}
