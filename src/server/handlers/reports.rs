//! Cage audit and reconciliation report endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::super::AppState;
use super::api_types::{error, ok, with_status, ApiResponse};
use super::helpers::{report_error, storage_error, ScopeParams};
use crate::models::{DucReportDraft, NewCageAuditMissort, Submitter};
use crate::reports::CageReturnSubmission;

#[derive(Debug, Deserialize)]
pub struct MissortSummaryRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub sub_depot_id: Option<i32>,
    pub submitted_by: Submitter,
}

#[derive(Debug, Deserialize)]
pub struct DucSubmission {
    #[serde(flatten)]
    pub draft: DucReportDraft,
    pub submitted_by: Submitter,
}

pub async fn list_missorts(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
) -> impl IntoResponse {
    match state
        .ctx
        .missorts()
        .list_for_date(params.date_or_today(), params.sub_depot)
        .await
    {
        Ok(rows) => ok(rows),
        Err(e) => storage_error(e),
    }
}

pub async fn add_missort(
    State(state): State<AppState>,
    Json(missort): Json<NewCageAuditMissort>,
) -> impl IntoResponse {
    if missort.sub_depot_id <= 0 || missort.round_id <= 0 || missort.client_id <= 0 {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Sub-depot, round and client are required",
        );
    }
    match state.ctx.missorts().add(&missort).await {
        Ok(row) => with_status(StatusCode::CREATED, ApiResponse::ok(row)),
        Err(e) => storage_error(e),
    }
}

pub async fn missort_summary(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
) -> impl IntoResponse {
    match state
        .reports
        .missort_summary(params.date_or_today(), params.sub_depot)
        .await
    {
        Ok(summary) => ok(summary),
        Err(e) => report_error(e),
    }
}

pub async fn save_missort_summary(
    State(state): State<AppState>,
    Json(body): Json<MissortSummaryRequest>,
) -> impl IntoResponse {
    match state
        .reports
        .save_missort_summary(body.date, body.sub_depot_id, body.submitted_by)
        .await
    {
        Ok(report) => with_status(StatusCode::CREATED, ApiResponse::ok(report)),
        Err(e) => report_error(e),
    }
}

pub async fn open_cage_return(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
) -> impl IntoResponse {
    let Some(sub_depot) = params.sub_depot else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "A sub-depot is required");
    };
    match state
        .reports
        .open_cage_return(params.date_or_today(), sub_depot)
        .await
    {
        Ok(sheet) => ok(sheet),
        Err(e) => report_error(e),
    }
}

pub async fn save_cage_return(
    State(state): State<AppState>,
    Json(submission): Json<CageReturnSubmission>,
) -> impl IntoResponse {
    match state.reports.save_cage_return(submission).await {
        Ok(report) => ok(report),
        Err(e) => report_error(e),
    }
}

/// Compute the ledger-derived DUC section for a date.
pub async fn import_missing_summary(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> impl IntoResponse {
    match state.reports.import_missing_summary(date).await {
        Ok(summary) => ok(summary),
        Err(e) => report_error(e),
    }
}

pub async fn submit_duc(
    State(state): State<AppState>,
    Json(body): Json<DucSubmission>,
) -> impl IntoResponse {
    match state.reports.submit_duc(&body.draft, body.submitted_by).await {
        Ok(report) => with_status(StatusCode::CREATED, ApiResponse::ok(report)),
        Err(e) => report_error(e),
    }
}

pub async fn get_duc(State(state): State<AppState>, Path(date): Path<NaiveDate>) -> impl IntoResponse {
    match state.reports.duc_report(date).await {
        Ok(Some(report)) => ok(report),
        Ok(None) => error(
            StatusCode::NOT_FOUND,
            format!("No DUC report submitted for {}", date),
        ),
        Err(e) => report_error(e),
    }
}
