/// Database models for HomeCare
///
/// This module contains the database models and their queries.
///
/// # Models
///
/// - `agency`: Agencies, the tenant boundary
/// - `user`: Users mirrored from the identity provider
/// - `membership`: User-agency links with roles
/// - `caregiver`: Caregiver roster records

pub mod agency;
pub mod caregiver;
pub mod membership;
pub mod user;
