/// Session token encoding and validation
///
/// The identity provider hands the browser an HS256-signed JWT. The subject
/// claim is the provider's stable user identifier; profile emails travel as
/// custom claims.
///
/// # Claims
///
/// - `sub`: Subject (identity provider user ID)
/// - `iss`: Issuer (checked only when an issuer is configured)
/// - `iat` / `nbf` / `exp`: Standard timestamps
/// - `email`: Primary email address (optional)
/// - `emails`: Every email address on the profile (optional)
///
/// # Example
///
/// ```
/// use homecare_shared::auth::jwt::{create_session_token, validate_session_token, SessionClaims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-session-secret-of-at-least-32-bytes";
/// let claims = SessionClaims::new("user_2abc").with_email("nurse@example.com");
/// let token = create_session_token(&claims, secret)?;
///
/// let validated = validate_session_token(&token, secret, None)?;
/// assert_eq!(validated.sub, "user_2abc");
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default lifetime of tokens minted by [`SessionClaims::new`]
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;

/// Error type for session token operations
#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, format or claim validation failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Issuer did not match the configured issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - identity provider user ID
    pub sub: String,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Primary email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// All email addresses on the profile, in provider order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
}

impl SessionClaims {
    /// Creates claims for `subject` valid for [`DEFAULT_SESSION_TTL_MINUTES`]
    pub fn new(subject: impl Into<String>) -> Self {
        Self::with_expiration(subject, Duration::minutes(DEFAULT_SESSION_TTL_MINUTES))
    }

    /// Creates claims with a custom lifetime
    ///
    /// A negative duration yields an already-expired token.
    pub fn with_expiration(subject: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.into(),
            iss: None,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: None,
            email: None,
            emails: Vec::new(),
        }
    }

    /// Sets the issuer claim
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Sets the primary email claim
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the list of profile email addresses
    pub fn with_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emails = emails.into_iter().map(Into::into).collect();
        self
    }
}

/// Signs claims into an HS256 token
pub fn create_session_token(claims: &SessionClaims, secret: &str) -> Result<String, SessionTokenError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| SessionTokenError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a session token and extracts its claims
///
/// Verifies the signature, expiration and, if present, not-before. When
/// `issuer` is `Some`, the `iss` claim must match it.
pub fn validate_session_token(
    token: &str,
    secret: &str,
    issuer: Option<&str>,
) -> Result<SessionClaims, SessionTokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionTokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => SessionTokenError::InvalidIssuer {
            expected: issuer.unwrap_or_default().to_string(),
        },
        _ => SessionTokenError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-session-secret-at-least-32-bytes!";

    #[test]
    fn test_token_carries_email_claims() {
        let claims = SessionClaims::new("user_1")
            .with_email("primary@example.com")
            .with_emails(["primary@example.com", "other@example.com"]);
        let token = create_session_token(&claims, SECRET).unwrap();

        let validated = validate_session_token(&token, SECRET, None).unwrap();
        assert_eq!(validated, claims);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_session_token(&SessionClaims::new("user_1"), SECRET).unwrap();

        let result = validate_session_token(&token, "another-secret-that-is-also-32-bytes", None);
        assert!(matches!(result, Err(SessionTokenError::ValidationError(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = SessionClaims::with_expiration("user_1", Duration::hours(-2));
        let token = create_session_token(&claims, SECRET).unwrap();

        let result = validate_session_token(&token, SECRET, None);
        assert!(matches!(result, Err(SessionTokenError::Expired)));
    }

    #[test]
    fn test_issuer_checked_when_configured() {
        let claims = SessionClaims::new("user_1").with_issuer("https://clerk.example.com");
        let token = create_session_token(&claims, SECRET).unwrap();

        assert!(validate_session_token(&token, SECRET, Some("https://clerk.example.com")).is_ok());
        assert!(matches!(
            validate_session_token(&token, SECRET, Some("https://elsewhere.example.com")),
            Err(SessionTokenError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let result = validate_session_token("not-a-jwt", SECRET, None);
        assert!(matches!(result, Err(SessionTokenError::ValidationError(_))));
    }
}
