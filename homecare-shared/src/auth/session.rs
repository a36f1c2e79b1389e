/// Session resolution
///
/// A [`SessionResolver`] answers "who is calling?" for an incoming request.
/// It either yields an [`Identity`] or reports that there is no session; it
/// never fails for any other reason.
///
/// The production resolver, [`BearerSessionResolver`], reads an
/// `Authorization: Bearer <token>` header and validates the token with
/// [`validate_session_token`](super::jwt::validate_session_token).

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::jwt::{validate_session_token, SessionClaims};

/// Verified caller identity as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable subject identifier
    pub user_id: String,

    /// Primary profile email, if the provider has one
    pub primary_email: Option<String>,

    /// Every email address on the profile, in provider order
    pub email_addresses: Vec<String>,
}

impl Identity {
    /// Identity with no profile emails
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            primary_email: None,
            email_addresses: Vec::new(),
        }
    }
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            primary_email: claims.email,
            email_addresses: claims.emails,
        }
    }
}

/// Resolves the caller of a request
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Returns the caller's identity, or `None` when there is no session
    async fn resolve(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// Resolves sessions from HS256 bearer tokens
#[derive(Debug, Clone)]
pub struct BearerSessionResolver {
    secret: String,
    issuer: Option<String>,
}

impl BearerSessionResolver {
    /// Creates a resolver validating tokens signed with `secret`
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: None,
        }
    }

    /// Additionally requires the `iss` claim to equal `issuer`
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

#[async_trait]
impl SessionResolver for BearerSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = bearer_token(headers)?;

        match validate_session_token(token, &self.secret, self.issuer.as_deref()) {
            Ok(claims) if !claims.sub.trim().is_empty() => Some(claims.into()),
            Ok(_) => {
                debug!("Session token has an empty subject");
                None
            }
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                None
            }
        }
    }
}

/// Extracts the token from an `Authorization: Bearer` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
