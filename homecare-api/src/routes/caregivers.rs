/// Caregiver roster endpoints
///
/// Both routes are tenant-scoped: the caller's agency is resolved from the
/// session and every query is filtered by it.
///
/// # Endpoints
///
/// ```text
/// GET  /api/caregivers
/// POST /api/caregivers
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use homecare_shared::models::caregiver::{Caregiver, CaregiverStatus, CreateCaregiver};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Roster response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListCaregiversResponse {
    pub ok: bool,
    pub caregivers: Vec<Caregiver>,
}

/// Create caregiver request
///
/// Any JSON document is accepted. Fields are read by their camelCase names;
/// missing, null or unusable values are stored as null.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CreateCaregiverRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub max_weekly_hours: Option<f64>,
    pub preferred_hours_per_week: Option<f64>,
}

impl CreateCaregiverRequest {
    /// Decodes a request body
    ///
    /// # Errors
    ///
    /// Returns a bad request when the body is not JSON or is JSON `null`.
    pub fn from_body(body: &[u8]) -> ApiResult<Self> {
        let value: Value = serde_json::from_slice(body)?;
        if value.is_null() {
            return Err(ApiError::BadRequest(
                "Request body must not be null".to_string(),
            ));
        }

        Ok(Self {
            first_name: text_field(&value, "firstName"),
            last_name: text_field(&value, "lastName"),
            email: text_field(&value, "email"),
            phone: text_field(&value, "phone"),
            max_weekly_hours: hours_field(&value, "maxWeeklyHours"),
            preferred_hours_per_week: hours_field(&value, "preferredHoursPerWeek"),
        })
    }
}

/// Strings pass through; numbers and booleans are stored in their JSON form
fn text_field(body: &Value, name: &str) -> Option<String> {
    match body.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers and numeric strings; anything else is null
fn hours_field(body: &Value, name: &str) -> Option<f64> {
    match body.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|h| h.is_finite()),
        _ => None,
    }
}

/// Created caregiver response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCaregiverResponse {
    pub ok: bool,
    pub caregiver: Caregiver,
}

/// Lists the caller's agency roster, newest first
pub async fn list_caregivers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ListCaregiversResponse>> {
    let context = state.tenant_resolver().require_current_agency(&headers).await?;

    let caregivers = state.caregivers.list_caregivers(context.agency_id).await?;

    Ok(Json(ListCaregiversResponse {
        ok: true,
        caregivers,
    }))
}

/// Adds a caregiver to the caller's agency
///
/// The body is decoded before the session is checked, so a malformed body
/// is a 400 even without a session. `Content-Type` is not inspected.
pub async fn create_caregiver(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CreateCaregiverResponse>)> {
    let req = CreateCaregiverRequest::from_body(&body)?;

    let context = state.tenant_resolver().require_current_agency(&headers).await?;

    let caregiver = state
        .caregivers
        .create_caregiver(CreateCaregiver {
            agency_id: context.agency_id,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            max_weekly_hours: req.max_weekly_hours,
            preferred_hours_per_week: req.preferred_hours_per_week,
            status: CaregiverStatus::Active,
        })
        .await?;

    info!(
        agency_id = %context.agency_id,
        caregiver_id = %caregiver.id,
        "Created caregiver"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateCaregiverResponse {
            ok: true,
            caregiver,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_reads_camel_case_fields() {
        let req = CreateCaregiverRequest::from_body(
            br#"{"firstName":"Ann","lastName":"Lee","email":"ann@agency.test","preferredHoursPerWeek":20}"#,
        )
        .unwrap();

        assert_eq!(req.first_name.as_deref(), Some("Ann"));
        assert_eq!(req.last_name.as_deref(), Some("Lee"));
        assert_eq!(req.email.as_deref(), Some("ann@agency.test"));
        assert_eq!(req.phone, None);
        assert_eq!(req.max_weekly_hours, None);
        assert_eq!(req.preferred_hours_per_week, Some(20.0));
    }

    #[test]
    fn test_request_coerces_mistyped_fields() {
        let req = CreateCaregiverRequest::from_body(
            br#"{"firstName":"Ann","maxWeeklyHours":"40","phone":5551234,"preferredHoursPerWeek":"lots","lastName":{"x":1}}"#,
        )
        .unwrap();

        assert_eq!(req.max_weekly_hours, Some(40.0));
        assert_eq!(req.phone.as_deref(), Some("5551234"));
        assert_eq!(req.preferred_hours_per_week, None);
        assert_eq!(req.last_name, None);
    }

    #[test]
    fn test_non_object_body_yields_blank_request() {
        let req = CreateCaregiverRequest::from_body(b"[1, 2]").unwrap();
        assert_eq!(req, CreateCaregiverRequest::default());
    }

    #[test]
    fn test_undecodable_or_null_body_is_rejected() {
        assert!(matches!(
            CreateCaregiverRequest::from_body(b"{not json"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            CreateCaregiverRequest::from_body(b""),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            CreateCaregiverRequest::from_body(b"null"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
