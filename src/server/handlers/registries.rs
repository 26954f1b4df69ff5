//! Registry list endpoints.
//!
//! Each registry is served as an independent flat list; clients join them
//! by primary key.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use super::super::AppState;
use super::api_types::ok;
use super::helpers::storage_error;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn list_clients(State(state): State<AppState>) -> impl IntoResponse {
    match state.ctx.registries().clients().await {
        Ok(rows) => ok(rows),
        Err(e) => storage_error(e),
    }
}

pub async fn list_couriers(State(state): State<AppState>) -> impl IntoResponse {
    match state.ctx.registries().couriers().await {
        Ok(rows) => ok(rows),
        Err(e) => storage_error(e),
    }
}

pub async fn list_rounds(State(state): State<AppState>) -> impl IntoResponse {
    match state.ctx.registries().rounds().await {
        Ok(rows) => ok(rows),
        Err(e) => storage_error(e),
    }
}

pub async fn list_sub_depots(State(state): State<AppState>) -> impl IntoResponse {
    match state.ctx.registries().sub_depots().await {
        Ok(rows) => ok(rows),
        Err(e) => storage_error(e),
    }
}

pub async fn list_team_members(State(state): State<AppState>) -> impl IntoResponse {
    match state.ctx.registries().team_members().await {
        Ok(rows) => ok(rows),
        Err(e) => storage_error(e),
    }
}

pub async fn list_delivery_units(State(state): State<AppState>) -> impl IntoResponse {
    match state.ctx.registries().delivery_units().await {
        Ok(rows) => ok(rows),
        Err(e) => storage_error(e),
    }
}
