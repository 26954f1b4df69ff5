//! In-memory ledger backend.
//!
//! Lock-based backend for tests and dry runs. State is not persisted across
//! restarts. Failures can be injected to exercise the "persistence failed,
//! local state untouched" paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::backend::LedgerBackend;
use crate::models::ParcelScanEntry;
use crate::repository::{to_diesel_error, DieselError};

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i32,
    rows: BTreeMap<i32, ParcelScanEntry>,
}

#[derive(Debug, Default)]
pub struct InMemoryLedgerBackend {
    state: RwLock<MemoryState>,
    fail_writes: AtomicBool,
    insert_calls: AtomicUsize,
}

impl InMemoryLedgerBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a storage error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `insert_batch` calls that reached the backend.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), DieselError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(to_diesel_error("storage unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LedgerBackend for InMemoryLedgerBackend {
    async fn insert_batch(
        &self,
        entries: &[ParcelScanEntry],
    ) -> Result<Vec<ParcelScanEntry>, DieselError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        let mut state = self.state.write().await;
        let mut stored = Vec::with_capacity(entries.len());
        for entry in entries {
            state.next_id += 1;
            let mut row = entry.clone();
            row.id = state.next_id;
            state.rows.insert(row.id, row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn update(&self, entry: &ParcelScanEntry) -> Result<ParcelScanEntry, DieselError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let row = state.rows.get_mut(&entry.id).ok_or(DieselError::NotFound)?;
        let recovery_date = row.recovery_date;
        *row = entry.clone();
        row.recovery_date = recovery_date;
        Ok(row.clone())
    }

    async fn set_recovery(
        &self,
        id: i32,
        recovery_date: Option<NaiveDate>,
    ) -> Result<ParcelScanEntry, DieselError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let row = state.rows.get_mut(&id).ok_or(DieselError::NotFound)?;
        row.recovery_date = recovery_date;
        Ok(row.clone())
    }

    async fn get(&self, id: i32) -> Result<Option<ParcelScanEntry>, DieselError> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<ParcelScanEntry>, DieselError> {
        Ok(self.state.read().await.rows.values().cloned().collect())
    }

    async fn list_for_date(
        &self,
        date: NaiveDate,
        sub_depot_id: Option<i32>,
    ) -> Result<Vec<ParcelScanEntry>, DieselError> {
        Ok(self
            .state
            .read()
            .await
            .rows
            .values()
            .filter(|e| e.date_added == date && sub_depot_id.map_or(true, |sd| e.sub_depot_id == sd))
            .cloned()
            .collect())
    }
}
