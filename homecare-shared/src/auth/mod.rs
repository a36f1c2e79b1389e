/// Authentication utilities
///
/// # Modules
///
/// - [`jwt`]: Session token creation and validation
/// - [`session`]: Caller identity and the [`session::SessionResolver`] seam
///
/// The identity provider owns sign-in; this service only verifies the
/// session tokens it issues.

pub mod jwt;
pub mod session;
