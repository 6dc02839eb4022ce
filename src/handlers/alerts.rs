use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use crate::constants::{MSG_INTERNAL_ERROR, MSG_INVALID_COMPANY_ID};
use crate::models::{AlertError, CompanyId, LowStockAlerts};
use crate::services::AlertService;

/// Create company alert routes
pub fn create_alert_routes() -> Router<AlertService> {
    Router::new().route("/{company_id}/alerts/low-stock", get(get_low_stock_alerts))
}

/// Low-stock alerts for one company
/// GET /api/companies/{company_id}/alerts/low-stock?limit={limit}&offset={offset}
#[instrument(skip(service, params), fields(request_id = %Uuid::new_v4()))]
async fn get_low_stock_alerts(
    State(service): State<AlertService>,
    company_id: Result<Path<String>, PathRejection>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<LowStockAlerts>, (StatusCode, Json<serde_json::Value>)> {
    // Undecodable segments get the same answer as non-numeric ones
    let company = match company_id
        .map_err(|e| AlertError::Validation(e.body_text()))
        .and_then(|Path(raw)| CompanyId::parse(&raw))
    {
        Ok(company) => company,
        Err(e) => return handle_alert_error(e),
    };

    let page = service.config().page(
        params.get("limit").map(|s| s.as_str()),
        params.get("offset").map(|s| s.as_str()),
    );

    match service.low_stock_alerts(company, page).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => handle_alert_error(e),
    }
}

fn handle_alert_error<T>(error: AlertError) -> Result<T, (StatusCode, Json<serde_json::Value>)> {
    match error {
        AlertError::Validation(msg) => {
            tracing::warn!("Rejected low-stock request: {msg}");
            Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": MSG_INVALID_COMPANY_ID })),
            ))
        }
        AlertError::Computation(msg) => {
            tracing::error!("Error fetching low stock alerts: {msg}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": MSG_INTERNAL_ERROR })),
            ))
        }
    }
}
