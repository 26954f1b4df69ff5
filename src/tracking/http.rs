//! HTTP client for the external tracking service.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CarrierTracker, TrackingError, TrackingStatus};

#[derive(Serialize)]
struct TrackingRequest<'a> {
    barcode: &'a str,
    carrier: &'a str,
}

#[derive(Deserialize)]
struct TrackingResponse {
    status: String,
    #[serde(default)]
    last_event_at: Option<DateTime<Utc>>,
}

/// Calls `POST {base_url}/api/tracking`. Without a base URL every lookup
/// fails with [`TrackingError::Disabled`].
pub struct HttpCarrierTracker {
    client: Client,
    base_url: Option<String>,
}

impl HttpCarrierTracker {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, TrackingError> {
        let client = Client::builder()
            .user_agent(concat!("depot-ledger/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }
}

#[async_trait]
impl CarrierTracker for HttpCarrierTracker {
    async fn lookup(&self, barcode: &str, carrier: &str) -> Result<TrackingStatus, TrackingError> {
        let base_url = self.base_url.as_deref().ok_or(TrackingError::Disabled)?;
        let url = format!("{}/api/tracking", base_url);
        debug!("Tracking lookup for {} via {}", barcode, carrier);

        let response = self
            .client
            .post(&url)
            .json(&TrackingRequest { barcode, carrier })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TrackingError::UnexpectedStatus(response.status().as_u16()));
        }

        let body: TrackingResponse = response
            .json()
            .await
            .map_err(|e| TrackingError::Decode(e.to_string()))?;

        Ok(TrackingStatus {
            barcode: barcode.to_string(),
            carrier: carrier.to_string(),
            status: body.status,
            last_event_at: body.last_event_at,
            checked_at: Utc::now(),
        })
    }
}
