//! Escalation checklist endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use super::super::AppState;
use super::api_types::{error, ok};
use super::helpers::{workflow_error, workflow_outcome};
use crate::escalation::ChecklistAnswer;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: ChecklistAnswer,
}

/// The open checklist, if any.
pub async fn checklist_view(State(state): State<AppState>) -> impl IntoResponse {
    let workflow = state.workflow.lock().await;
    match workflow.view() {
        Some(view) => ok(view),
        None => error(StatusCode::NOT_FOUND, "No checklist is in progress"),
    }
}

/// Answer the current question. The final "yes" runs the held action and
/// returns its result.
pub async fn checklist_answer(
    State(state): State<AppState>,
    Json(body): Json<AnswerRequest>,
) -> impl IntoResponse {
    let mut workflow = state.workflow.lock().await;
    match workflow.answer(body.answer).await {
        Ok(outcome) => workflow_outcome(outcome),
        Err(e) => workflow_error(e),
    }
}

pub async fn checklist_cancel(State(state): State<AppState>) -> impl IntoResponse {
    let mut workflow = state.workflow.lock().await;
    match workflow.cancel() {
        Ok(outcome) => workflow_outcome(outcome),
        Err(e) => workflow_error(e),
    }
}
