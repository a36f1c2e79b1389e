/// Multi-tenancy for HomeCare
///
/// Every piece of business data belongs to exactly one agency. This module
/// maps callers to agencies and provisions new callers.
///
/// # Modules
///
/// - `store`: Storage traits and the PostgreSQL implementation
/// - `memory`: In-memory store for tests and demos
/// - `policy`: Which agency a new identity joins
/// - `resolver`: Caller to agency resolution for tenant-scoped routes
/// - `bootstrap`: Idempotent first-login provisioning

pub mod bootstrap;
pub mod memory;
pub mod policy;
pub mod resolver;
pub mod store;

pub use bootstrap::{derive_display_email, BootstrapError, BootstrapOutcome, Bootstrapper};
pub use memory::{InMemoryStore, StoreOperation};
pub use policy::{
    PersonalAgencyPolicy, Placement, ProvisioningMode, ProvisioningPolicy, SharedAgencyPolicy,
    DEFAULT_AGENCY_NAME,
};
pub use resolver::{AgencyContext, TenantError, TenantResolver};
pub use store::{CaregiverStore, PgStore, StoreError, StoreResult, TenancyStore};
