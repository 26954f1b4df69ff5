//! JSON envelope and view types for API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::models::{ParcelScanEntry, ScanType};

/// Envelope shared by every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub error: bool,
    pub context: Value,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            error: false,
            context: Value::Object(Default::default()),
            data,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

impl ApiResponse<Value> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: true,
            context: serde_json::json!({ "message": message.into() }),
            data: Value::Null,
        }
    }
}

/// 200 with the envelope around `data`.
pub fn ok<T: Serialize>(data: T) -> Response {
    Json(ApiResponse::ok(data)).into_response()
}

pub fn with_status<T: Serialize>(status: StatusCode, body: ApiResponse<T>) -> Response {
    (status, Json(body)).into_response()
}

pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::error(message))).into_response()
}

/// Ledger entry as exposed over the API, with the scan type flattened into
/// its optional reference columns.
#[derive(Debug, Serialize)]
pub struct ParcelView {
    pub id: i32,
    pub barcode: String,
    pub round_id: i32,
    pub drop_number: i32,
    pub sub_depot_id: i32,
    pub courier_id: String,
    pub sorter_team_member_id: i32,
    pub client_id: i32,
    pub time_scanned: DateTime<Utc>,
    pub scan_type: ScanType,
    pub cfwd_courier_id: Option<String>,
    pub misrouted_du_id: Option<i32>,
    pub rejected_courier_id: Option<String>,
    pub is_recovered: bool,
    pub recovery_date: Option<NaiveDate>,
    pub date_added: NaiveDate,
}

impl From<&ParcelScanEntry> for ParcelView {
    fn from(entry: &ParcelScanEntry) -> Self {
        Self {
            id: entry.id,
            barcode: entry.barcode.clone(),
            round_id: entry.round_id,
            drop_number: entry.drop_number,
            sub_depot_id: entry.sub_depot_id,
            courier_id: entry.courier_id.clone(),
            sorter_team_member_id: entry.sorter_team_member_id,
            client_id: entry.client_id,
            time_scanned: entry.time_scanned,
            cfwd_courier_id: entry.scan_type.cfwd_courier_id().map(str::to_string),
            misrouted_du_id: entry.scan_type.misrouted_du_id(),
            rejected_courier_id: entry.scan_type.rejected_courier_id().map(str::to_string),
            scan_type: entry.scan_type.clone(),
            is_recovered: entry.is_recovered(),
            recovery_date: entry.recovery_date,
            date_added: entry.date_added,
        }
    }
}

pub fn parcel_views<'a>(entries: impl IntoIterator<Item = &'a ParcelScanEntry>) -> Vec<ParcelView> {
    entries.into_iter().map(ParcelView::from).collect()
}
