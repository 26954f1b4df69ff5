//! Missing-parcel ledger endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::super::AppState;
use super::api_types::{error, ok, parcel_views, ParcelView};
use super::helpers::{ledger_error, workflow_error, workflow_outcome, ScopeParams};
use crate::models::{NewParcelEntry, ParcelPatch, ParcelScanEntry};

#[derive(Debug, Deserialize)]
pub struct RecoveryRequest {
    pub recovered: bool,
}

/// List ledger entries, optionally scoped to a date and sub-depot.
///
/// Unrecovered entries that have not been tracked yet in this session are
/// auto-checked in the background.
pub async fn list_parcels(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
) -> impl IntoResponse {
    let (entries, registry) = {
        let workflow = state.workflow.lock().await;
        let ledger = workflow.ledger();
        let entries: Vec<ParcelScanEntry> = match params.date {
            Some(date) => ledger.entries_for(date, params.sub_depot).cloned().collect(),
            None => ledger
                .entries()
                .filter(|e| params.sub_depot.map_or(true, |sd| e.sub_depot_id == sd))
                .cloned()
                .collect(),
        };
        (entries, workflow.registry().clone())
    };

    let due: Vec<ParcelScanEntry> = entries
        .iter()
        .filter(|e| !e.is_recovered())
        .cloned()
        .collect();
    if !due.is_empty() {
        let refresher = state.tracking.clone();
        tokio::spawn(async move {
            refresher.auto_check(&due, &registry).await;
        });
    }

    ok(parcel_views(&entries))
}

pub async fn get_parcel(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    let workflow = state.workflow.lock().await;
    match workflow.ledger().get(id) {
        Some(entry) => ok(ParcelView::from(entry)),
        None => error(
            StatusCode::NOT_FOUND,
            format!("Missing parcel {} not found", id),
        ),
    }
}

/// Batch append. Invalid rows are skipped; a high-priority parcel opens the
/// checklist and nothing is written until it completes.
pub async fn append_parcels(
    State(state): State<AppState>,
    Json(candidates): Json<Vec<NewParcelEntry>>,
) -> impl IntoResponse {
    if candidates.is_empty() {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "No parcels submitted");
    }
    let mut workflow = state.workflow.lock().await;
    match workflow.submit_append(candidates).await {
        Ok(outcome) => workflow_outcome(outcome),
        Err(e) => workflow_error(e),
    }
}

pub async fn edit_parcel(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<ParcelPatch>,
) -> impl IntoResponse {
    let mut workflow = state.workflow.lock().await;
    match workflow.submit_edit(id, patch).await {
        Ok(outcome) => workflow_outcome(outcome),
        Err(e) => workflow_error(e),
    }
}

pub async fn set_recovery(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<RecoveryRequest>,
) -> impl IntoResponse {
    let mut workflow = state.workflow.lock().await;
    match workflow.set_recovered(id, body.recovered).await {
        Ok(entry) => ok(ParcelView::from(&entry)),
        Err(e) => workflow_error(e),
    }
}

/// Entries are never removed through the API.
pub async fn delete_parcel(Path(id): Path<i32>) -> impl IntoResponse {
    tracing::debug!("Rejected delete of missing parcel {}", id);
    error(
        StatusCode::METHOD_NOT_ALLOWED,
        "Missing parcels cannot be deleted; mark them recovered instead",
    )
}

/// Load a single entry for tracking handlers.
pub(super) async fn find_parcel(
    state: &AppState,
    id: i32,
) -> Result<(ParcelScanEntry, crate::models::RegistrySnapshot), axum::response::Response> {
    let workflow = state.workflow.lock().await;
    match workflow.ledger().get(id) {
        Some(entry) => Ok((entry.clone(), workflow.registry().clone())),
        None => Err(ledger_error(crate::ledger::LedgerError::NotFound(id))),
    }
}
