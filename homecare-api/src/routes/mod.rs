/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `me`: Caller bootstrap
/// - `caregivers`: Tenant-scoped caregiver roster

pub mod caregivers;
pub mod health;
pub mod me;
