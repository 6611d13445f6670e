//! Admission Routes - Gate status and live tuning

use axum::{extract::State, routing::get, Json, Router};

use engram::{AdmissionConfig, AdmissionConfigUpdate, AdmissionStatus};

use super::{domain_error, ApiError};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/engram/admission", get(get_status).patch(update_config))
}

/// Current admission config and per-session counters
#[utoipa::path(
    get,
    path = "/engram/admission",
    responses(
        (status = 200, description = "Admission status", body = AdmissionStatus)
    ),
    tag = "Admission"
)]
pub async fn get_status(State(state): State<AppState>) -> Json<AdmissionStatus> {
    Json(state.hub.status())
}

/// Merge a partial config update
#[utoipa::path(
    patch,
    path = "/engram/admission",
    request_body = AdmissionConfigUpdate,
    responses(
        (status = 200, description = "Updated config", body = AdmissionConfig),
        (status = 400, description = "Invalid value, nothing changed")
    ),
    tag = "Admission"
)]
pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<AdmissionConfigUpdate>,
) -> Result<Json<AdmissionConfig>, ApiError> {
    let config = state.hub.update_config(update).map_err(domain_error)?;
    Ok(Json(config))
}
