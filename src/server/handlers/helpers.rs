//! Error mapping and shared request types for handlers.

use axum::{http::StatusCode, response::Response};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::api_types::{error, parcel_views, with_status, ApiResponse, ParcelView};
use crate::ledger::LedgerError;
use crate::reports::ReportError;
use crate::workflow::{WorkflowError, WorkflowOutcome};

/// Query params for date/sub-depot scoped listings.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeParams {
    pub date: Option<NaiveDate>,
    pub sub_depot: Option<i32>,
}

impl ScopeParams {
    pub fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(crate::models::today)
    }
}

pub fn ledger_error(e: LedgerError) -> Response {
    match e {
        LedgerError::Validation(msg) => error(StatusCode::UNPROCESSABLE_ENTITY, msg),
        LedgerError::NotFound(id) => error(
            StatusCode::NOT_FOUND,
            format!("Missing parcel {} not found", id),
        ),
        LedgerError::Database(e) => {
            tracing::error!("Ledger storage failure: {}", e);
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save changes")
        }
    }
}

pub fn workflow_error(e: WorkflowError) -> Response {
    match e {
        WorkflowError::ChecklistActive | WorkflowError::NoActiveChecklist => {
            error(StatusCode::CONFLICT, e.to_string())
        }
        WorkflowError::Ledger(e) => ledger_error(e),
    }
}

pub fn report_error(e: ReportError) -> Response {
    match e {
        ReportError::SummaryNotImported(_) | ReportError::InvalidScope(_) => {
            error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        ReportError::Database(e) => {
            tracing::error!("Report storage failure: {}", e);
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load or save the report")
        }
    }
}

pub fn storage_error(e: diesel::result::Error) -> Response {
    tracing::error!("Storage failure: {}", e);
    error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Render the result of a gated or direct workflow action.
pub fn workflow_outcome(outcome: WorkflowOutcome) -> Response {
    match outcome {
        WorkflowOutcome::Appended(outcome) if outcome.persisted.is_empty() => with_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiResponse {
                error: true,
                context: json!({
                    "message": "No valid parcels to log",
                    "skipped": outcome.skipped,
                }),
                data: serde_json::Value::Null,
            },
        ),
        WorkflowOutcome::Appended(outcome) => with_status(
            StatusCode::CREATED,
            ApiResponse::ok(parcel_views(&outcome.persisted))
                .with_context(json!({ "skipped": outcome.skipped })),
        ),
        WorkflowOutcome::Edited(entry) => with_status(
            StatusCode::OK,
            ApiResponse::ok(ParcelView::from(&entry)),
        ),
        WorkflowOutcome::ChecklistPending(view) => with_status(
            StatusCode::ACCEPTED,
            ApiResponse::ok(view).with_context(json!({ "checklist": "pending" })),
        ),
        WorkflowOutcome::ChecklistAborted => with_status(
            StatusCode::OK,
            ApiResponse::ok(serde_json::Value::Null)
                .with_context(json!({ "checklist": "aborted" })),
        ),
    }
}
