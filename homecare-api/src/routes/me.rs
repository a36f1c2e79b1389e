/// Caller endpoints
///
/// # Endpoints
///
/// ```text
/// GET /api/me/init
/// ```
///
/// Called by the client right after sign-in. Provisions the caller's user
/// row, agency and membership if they are missing, and reports where the
/// caller landed. Safe to call on every page load.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bootstrap response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    pub ok: bool,
    pub user_id: String,
    pub email: String,
    pub agency_id: Uuid,
}

/// Bootstrap handler
///
/// # Errors
///
/// - 401 when there is no session
/// - 500 when a provisioning write fails
pub async fn init(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<InitResponse>> {
    let outcome = state.bootstrapper().bootstrap(&headers).await?;

    Ok(Json(InitResponse {
        ok: true,
        user_id: outcome.user_id,
        email: outcome.email,
        agency_id: outcome.agency_id,
    }))
}
