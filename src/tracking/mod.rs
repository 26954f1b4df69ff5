//! Best-effort carrier tracking for missing parcels.
//!
//! Tracking is an optional external service. Lookups never block ledger
//! operations, and one failing lookup never affects its siblings.

mod http;
mod refresher;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpCarrierTracker;
pub use refresher::{RefreshError, RefreshReport, TrackingRefresher};

/// Latest known tracking state of one parcel. Kept in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStatus {
    pub barcode: String,
    pub carrier: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_at: Option<DateTime<Utc>>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Carrier tracking is not configured")]
    Disabled,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Tracking service returned status {0}")]
    UnexpectedStatus(u16),
    #[error("Invalid tracking response: {0}")]
    Decode(String),
}

/// Lookup-or-create of a tracking record keyed by barcode and carrier.
#[async_trait]
pub trait CarrierTracker: Send + Sync {
    async fn lookup(&self, barcode: &str, carrier: &str) -> Result<TrackingStatus, TrackingError>;
}
