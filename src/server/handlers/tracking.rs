//! Carrier tracking endpoints.
//!
//! Lookups are best-effort: failures are reported per parcel and never turn
//! into a failed request, except for the manual refresh cooldown.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use super::super::AppState;
use super::api_types::{error, ok, with_status, ApiResponse};
use super::parcels::find_parcel;
use crate::models::ParcelScanEntry;
use crate::tracking::{RefreshError, TrackingError};

/// Cached statuses keyed by parcel id.
pub async fn tracking_statuses(State(state): State<AppState>) -> impl IntoResponse {
    ok(state.tracking.statuses().await)
}

/// Refresh every unrecovered parcel. Throttled by the configured cooldown.
pub async fn refresh_tracking(State(state): State<AppState>) -> impl IntoResponse {
    let (parcels, registry) = {
        let workflow = state.workflow.lock().await;
        let parcels: Vec<ParcelScanEntry> = workflow.ledger().unrecovered().cloned().collect();
        (parcels, workflow.registry().clone())
    };

    match state.tracking.refresh_all(&parcels, &registry).await {
        Ok(report) => {
            let failures: Vec<_> = report
                .failed
                .iter()
                .map(|(id, e)| json!({ "id": id, "error": e.to_string() }))
                .collect();
            ok(json!({
                "updated": report.updated.len(),
                "failed": report.failed.len(),
                "failures": failures,
            }))
        }
        Err(RefreshError::CoolingDown { remaining }) => with_status(
            StatusCode::TOO_MANY_REQUESTS,
            ApiResponse {
                error: true,
                context: json!({
                    "message": "Tracking was refreshed recently; try again shortly",
                    "retry_after_secs": remaining.as_secs().max(1),
                }),
                data: serde_json::Value::Null,
            },
        ),
    }
}

/// Refresh one parcel. Not throttled.
pub async fn refresh_parcel_tracking(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let (parcel, registry) = match find_parcel(&state, id).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    match state.tracking.refresh_one(&parcel, &registry).await {
        Ok(status) => ok(status),
        Err(TrackingError::Disabled) => {
            error(StatusCode::SERVICE_UNAVAILABLE, TrackingError::Disabled.to_string())
        }
        Err(e) => {
            tracing::warn!("Tracking lookup for {} failed: {}", parcel.barcode, e);
            error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
