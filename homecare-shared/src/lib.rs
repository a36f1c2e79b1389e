//! # HomeCare Shared Library
//!
//! Types, storage and tenancy logic used by the HomeCare API server.
//!
//! ## Module Organization
//!
//! - `auth`: Session token verification and caller identity
//! - `db`: Connection pool and migrations
//! - `models`: Database models and queries
//! - `tenancy`: Agency resolution and first-login provisioning

pub mod auth;
pub mod db;
pub mod models;
pub mod tenancy;

/// Current version of the HomeCare shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
