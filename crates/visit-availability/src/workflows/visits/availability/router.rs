use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::super::domain::{PrisonerId, Restriction};
use super::service::{AvailabilityError, AvailabilityRequest, AvailabilityService};

/// Router builder exposing the availability read endpoint.
pub fn availability_router(service: Arc<AvailabilityService>) -> Router {
    Router::new()
        .route(
            "/api/v1/prisons/:prison_code/prisoners/:prisoner_id/visit-sessions/available",
            get(available_sessions_handler),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvailabilityParams {
    #[serde(default)]
    pub(crate) restriction: Option<Restriction>,
    /// Comma-separated visitor identifiers.
    #[serde(default)]
    pub(crate) visitors: Option<String>,
    #[serde(default = "default_appointment_check")]
    pub(crate) appointment_check: bool,
    /// Reference-date override for deterministic calls; defaults to today.
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

fn default_appointment_check() -> bool {
    true
}

pub(crate) async fn available_sessions_handler(
    State(service): State<Arc<AvailabilityService>>,
    Path((prison_code, prisoner_id)): Path<(String, String)>,
    Query(params): Query<AvailabilityParams>,
) -> Response {
    let visitor_ids = match parse_visitor_ids(params.visitors.as_deref()) {
        Ok(ids) => ids,
        Err(raw) => {
            let payload = json!({ "error": format!("visitor id '{raw}' is not numeric") });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let request = AvailabilityRequest {
        prison_code,
        prisoner_id: PrisonerId(prisoner_id),
        requested_restriction: params.restriction,
        visitor_ids,
        appointment_check: params.appointment_check,
        today: params.today,
    };

    match service.available_visit_sessions(request).await {
        Ok(sessions) => (StatusCode::OK, axum::Json(sessions)).into_response(),
        Err(err @ AvailabilityError::UnknownPrison(_)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
    }
}

fn parse_visitor_ids(raw: Option<&str>) -> Result<Vec<i64>, String> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<i64>().map_err(|_| part.to_string()))
        .collect()
}
