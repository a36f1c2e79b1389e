/// Error handling for the API server
///
/// Handlers return `Result<T, ApiError>`; every error renders as the same
/// envelope:
///
/// ```json
/// { "ok": false, "error": "No agency membership found for current user" }
/// ```
///
/// # Status mapping
///
/// | Source                                   | Status |
/// |------------------------------------------|--------|
/// | no session                               | 401    |
/// | tenant resolution failure, bad JSON body | 400    |
/// | store failure in a handler's own query   | 500    |
///
/// Store messages are passed through verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use homecare_shared::tenancy::{BootstrapError, StoreError, TenantError};
use serde::{Deserialize, Serialize};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No session (401)
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Bad request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Store failure (500)
    #[error("{0}")]
    Persistence(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub ok: bool,

    /// Human-readable error message
    pub error: String,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let ApiError::Persistence(msg) = &self {
            tracing::error!(error = %msg, "Store operation failed");
        }

        let body = Json(ErrorResponse {
            ok: false,
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Tenant resolution failures other than a missing session are client errors
impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::Unauthenticated => ApiError::Unauthenticated,
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<BootstrapError> for ApiError {
    fn from(err: BootstrapError) -> Self {
        match err {
            BootstrapError::Unauthenticated => ApiError::Unauthenticated,
            BootstrapError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Persistence(err.to_string())
    }
}

/// Undecodable request bodies
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ApiError::Unauthenticated.to_string(), "Unauthenticated");

        let err = ApiError::Persistence("connection refused".to_string());
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_tenant_error_mapping() {
        assert!(matches!(
            ApiError::from(TenantError::Unauthenticated),
            ApiError::Unauthenticated
        ));

        let err = ApiError::from(TenantError::NoTenant);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No agency membership found for current user");

        let err = ApiError::from(TenantError::Store(StoreError::Backend(
            "timeout".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn test_bootstrap_store_failure_is_server_error() {
        let err = ApiError::from(BootstrapError::Store(StoreError::Backend(
            "disk full".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "disk full");
    }

    #[tokio::test]
    async fn test_response_envelope() {
        let response = ApiError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "ok": false, "error": "Unauthenticated" }));
    }
}
