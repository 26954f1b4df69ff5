//! Tracking refresh scheduling.
//!
//! Manual "refresh all" is throttled by a fixed cooldown. Automatic checks
//! visit each parcel at most once per refresher session; a manual refresh of
//! one parcel always runs. Lookups run concurrently and are joined
//! all-settled.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{CarrierTracker, TrackingError, TrackingStatus};
use crate::models::{ParcelScanEntry, RegistrySnapshot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error("Tracking was refreshed recently; try again in {}s", .remaining.as_secs().max(1))]
    CoolingDown { remaining: Duration },
}

/// Per-parcel results of a refresh run.
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub updated: Vec<(i32, TrackingStatus)>,
    pub failed: Vec<(i32, TrackingError)>,
}

impl RefreshReport {
    pub fn attempted(&self) -> usize {
        self.updated.len() + self.failed.len()
    }
}

#[derive(Default)]
struct RefreshState {
    last_manual_refresh: Option<Instant>,
    auto_checked: HashSet<i32>,
    statuses: HashMap<i32, TrackingStatus>,
}

pub struct TrackingRefresher {
    tracker: Arc<dyn CarrierTracker>,
    cooldown: Duration,
    default_carrier: String,
    state: RwLock<RefreshState>,
}

impl TrackingRefresher {
    pub fn new(tracker: Arc<dyn CarrierTracker>, cooldown: Duration, default_carrier: &str) -> Self {
        Self {
            tracker,
            cooldown,
            default_carrier: default_carrier.to_string(),
            state: RwLock::new(RefreshState::default()),
        }
    }

    /// Manual refresh of every given parcel, subject to the cooldown.
    pub async fn refresh_all(
        &self,
        parcels: &[ParcelScanEntry],
        registry: &RegistrySnapshot,
    ) -> Result<RefreshReport, RefreshError> {
        {
            let mut state = self.state.write().await;
            if let Some(last) = state.last_manual_refresh {
                let elapsed = last.elapsed();
                if elapsed < self.cooldown {
                    return Err(RefreshError::CoolingDown {
                        remaining: self.cooldown - elapsed,
                    });
                }
            }
            state.last_manual_refresh = Some(Instant::now());
        }

        let report = self.run(parcels, registry).await;
        info!(
            "Tracking refresh: {} updated, {} failed",
            report.updated.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Check parcels that have not been auto-checked in this session yet.
    pub async fn auto_check(
        &self,
        parcels: &[ParcelScanEntry],
        registry: &RegistrySnapshot,
    ) -> RefreshReport {
        let due: Vec<ParcelScanEntry> = {
            let mut state = self.state.write().await;
            parcels
                .iter()
                .filter(|p| state.auto_checked.insert(p.id))
                .cloned()
                .collect()
        };
        if due.is_empty() {
            return RefreshReport::default();
        }
        debug!("Auto-checking tracking for {} parcel(s)", due.len());
        self.run(&due, registry).await
    }

    /// Manual refresh of one parcel. Not throttled.
    pub async fn refresh_one(
        &self,
        parcel: &ParcelScanEntry,
        registry: &RegistrySnapshot,
    ) -> Result<TrackingStatus, TrackingError> {
        let carrier = self.carrier_for(parcel, registry);
        let status = self.tracker.lookup(&parcel.barcode, &carrier).await?;

        let mut state = self.state.write().await;
        state.auto_checked.insert(parcel.id);
        state.statuses.insert(parcel.id, status.clone());
        Ok(status)
    }

    /// Cached statuses by parcel id.
    pub async fn statuses(&self) -> HashMap<i32, TrackingStatus> {
        self.state.read().await.statuses.clone()
    }

    pub async fn status(&self, parcel_id: i32) -> Option<TrackingStatus> {
        self.state.read().await.statuses.get(&parcel_id).cloned()
    }

    fn carrier_for(&self, parcel: &ParcelScanEntry, registry: &RegistrySnapshot) -> String {
        registry
            .client(parcel.client_id)
            .and_then(|c| c.tracking_carrier.clone())
            .unwrap_or_else(|| self.default_carrier.clone())
    }

    async fn run(&self, parcels: &[ParcelScanEntry], registry: &RegistrySnapshot) -> RefreshReport {
        let lookups = parcels.iter().map(|parcel| {
            let carrier = self.carrier_for(parcel, registry);
            async move {
                let result = self.tracker.lookup(&parcel.barcode, &carrier).await;
                (parcel.id, result)
            }
        });
        let results = join_all(lookups).await;

        let mut report = RefreshReport::default();
        let mut state = self.state.write().await;
        for (id, result) in results {
            match result {
                Ok(status) => {
                    state.statuses.insert(id, status.clone());
                    report.updated.push((id, status));
                }
                Err(e) => {
                    warn!("Tracking lookup failed for parcel {}: {}", id, e);
                    report.failed.push((id, e));
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, RegistryImport, ScanType};
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use std::sync::Mutex;

    /// Records lookups and fails for barcodes starting with "FAIL".
    #[derive(Default)]
    struct MockTracker {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockTracker {
        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CarrierTracker for MockTracker {
        async fn lookup(&self, barcode: &str, carrier: &str) -> Result<TrackingStatus, TrackingError> {
            self.calls
                .lock()
                .unwrap()
                .push((barcode.to_string(), carrier.to_string()));
            if barcode.starts_with("FAIL") {
                return Err(TrackingError::UnexpectedStatus(502));
            }
            Ok(TrackingStatus {
                barcode: barcode.to_string(),
                carrier: carrier.to_string(),
                status: "in_transit".into(),
                last_event_at: None,
                checked_at: Utc::now(),
            })
        }
    }

    fn parcel(id: i32, barcode: &str, client_id: i32) -> ParcelScanEntry {
        ParcelScanEntry {
            id,
            barcode: barcode.into(),
            round_id: 1,
            drop_number: 0,
            sub_depot_id: 71,
            courier_id: "C001".into(),
            sorter_team_member_id: 3,
            client_id,
            time_scanned: Utc::now(),
            scan_type: ScanType::Standard,
            recovery_date: None,
            date_added: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        }
    }

    fn registry() -> RegistrySnapshot {
        RegistrySnapshot::from_lists(RegistryImport {
            clients: vec![Client {
                id: 2,
                name: "ASOS".into(),
                is_high_priority: true,
                tracking_carrier: Some("evri".into()),
            }],
            ..Default::default()
        })
    }

    fn refresher(cooldown: Duration) -> (TrackingRefresher, Arc<MockTracker>) {
        let tracker = Arc::new(MockTracker::default());
        (
            TrackingRefresher::new(tracker.clone(), cooldown, "dpd"),
            tracker,
        )
    }

    #[tokio::test]
    async fn test_failure_does_not_block_siblings() {
        let (refresher, _tracker) = refresher(Duration::from_secs(30));
        let parcels = vec![
            parcel(1, "AAAAAAAAAAAAAAA1", 1),
            parcel(2, "FAILAAAAAAAAAAA2", 1),
            parcel(3, "AAAAAAAAAAAAAAA3", 2),
        ];

        let report = refresher.refresh_all(&parcels, &registry()).await.unwrap();
        assert_eq!(report.attempted(), 3);
        assert_eq!(report.updated.len(), 2);
        assert_eq!(report.failed[0].0, 2);

        let statuses = refresher.statuses().await;
        assert_eq!(statuses[&3].carrier, "evri");
        assert_eq!(statuses[&1].carrier, "dpd");
        assert!(!statuses.contains_key(&2));
    }

    #[tokio::test]
    async fn test_manual_refresh_respects_cooldown() {
        let (refresher, tracker) = refresher(Duration::from_secs(30));
        let parcels = vec![parcel(1, "AAAAAAAAAAAAAAA1", 1)];

        refresher.refresh_all(&parcels, &registry()).await.unwrap();
        match refresher.refresh_all(&parcels, &registry()).await {
            Err(RefreshError::CoolingDown { remaining }) => {
                assert!(remaining > Duration::from_secs(25));
                assert!(remaining <= Duration::from_secs(30));
            }
            other => panic!("expected cooldown, got {:?}", other.map(|r| r.attempted())),
        }
        assert_eq!(tracker.calls().len(), 1);

        // Single-parcel refresh is never throttled
        refresher.refresh_one(&parcels[0], &registry()).await.unwrap();
        assert_eq!(tracker.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_cooldown_allows_back_to_back_refresh() {
        let (refresher, tracker) = refresher(Duration::ZERO);
        let parcels = vec![parcel(1, "AAAAAAAAAAAAAAA1", 1)];
        refresher.refresh_all(&parcels, &registry()).await.unwrap();
        refresher.refresh_all(&parcels, &registry()).await.unwrap();
        assert_eq!(tracker.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_auto_check_visits_each_parcel_once() {
        let (refresher, tracker) = refresher(Duration::from_secs(30));
        let first = vec![parcel(1, "AAAAAAAAAAAAAAA1", 1), parcel(2, "FAILAAAAAAAAAAA2", 1)];

        assert_eq!(refresher.auto_check(&first, &registry()).await.attempted(), 2);
        assert_eq!(refresher.auto_check(&first, &registry()).await.attempted(), 0);

        let mut more = first.clone();
        more.push(parcel(3, "AAAAAAAAAAAAAAA3", 2));
        let report = refresher.auto_check(&more, &registry()).await;
        assert_eq!(report.attempted(), 1);
        assert_eq!(report.updated[0].0, 3);
        assert_eq!(tracker.calls().len(), 3);
    }
}
