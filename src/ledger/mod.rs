//! Missing-parcel ledger.
//!
//! The ledger is the append/mutate store of individual missing-parcel scan
//! records. It validates input against the reference registries, persists
//! through a [`LedgerBackend`] and keeps a normalized in-memory copy keyed by
//! id. After a mutation only the affected rows are upserted into that copy;
//! the full list is never refetched. A failed persistence call leaves the
//! copy untouched.
//!
//! The ledger does not decide whether the escalation checklist applies.
//! Callers that need the gate (see [`crate::workflow`]) must pass it before
//! calling [`ParcelLedger::append`] or [`ParcelLedger::edit`].

mod backend;
mod error;
mod memory;
mod recovery;
pub mod validation;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

pub use backend::LedgerBackend;
pub use error::LedgerError;
pub use memory::InMemoryLedgerBackend;
pub use recovery::{RecoverySnapshot, RecoveryTracker};

use crate::models::{today, NewParcelEntry, ParcelPatch, ParcelScanEntry, RegistrySnapshot};
use validation::{build_entry, normalize_barcode, validate_entry};

/// Result of a batch append. Partial success is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    pub persisted: Vec<ParcelScanEntry>,
    pub skipped: usize,
}

pub struct ParcelLedger {
    backend: Arc<dyn LedgerBackend>,
    registry: Arc<RegistrySnapshot>,
    store: BTreeMap<i32, ParcelScanEntry>,
}

impl ParcelLedger {
    pub fn new(backend: Arc<dyn LedgerBackend>, registry: Arc<RegistrySnapshot>) -> Self {
        Self {
            backend,
            registry,
            store: BTreeMap::new(),
        }
    }

    /// Create a ledger and hydrate its store from persistence.
    pub async fn open(
        backend: Arc<dyn LedgerBackend>,
        registry: Arc<RegistrySnapshot>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(backend, registry);
        ledger.load().await?;
        Ok(ledger)
    }

    /// Replace the in-memory store with the persisted rows.
    pub async fn load(&mut self) -> Result<usize, LedgerError> {
        let rows = self.backend.list().await?;
        self.store = rows.into_iter().map(|e| (e.id, e)).collect();
        debug!("Loaded {} ledger entries", self.store.len());
        Ok(self.store.len())
    }

    pub fn registry(&self) -> &RegistrySnapshot {
        &self.registry
    }

    /// Validate every candidate and persist the valid subset in one batch.
    pub async fn append(&mut self, candidates: &[NewParcelEntry]) -> Result<AppendOutcome, LedgerError> {
        let mut valid = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match build_entry(candidate, &self.registry) {
                Ok(entry) => valid.push(entry),
                Err(reason) => debug!("Skipping parcel '{}': {}", candidate.barcode, reason),
            }
        }

        let persisted = if valid.is_empty() {
            Vec::new()
        } else {
            self.backend.insert_batch(&valid).await?
        };
        for entry in &persisted {
            self.store.insert(entry.id, entry.clone());
        }

        let skipped = candidates.len().saturating_sub(persisted.len());
        info!(
            "Logged {} missing parcel(s), skipped {}",
            persisted.len(),
            skipped
        );
        Ok(AppendOutcome { persisted, skipped })
    }

    /// Validate a correction without persisting it. Returns the entry as it
    /// would look after the edit.
    pub async fn preview_edit(
        &self,
        id: i32,
        patch: &ParcelPatch,
    ) -> Result<ParcelScanEntry, LedgerError> {
        let mut updated = self.require(id).await?;
        let mut patch = patch.clone();
        if let Some(barcode) = patch.barcode.as_mut() {
            *barcode = normalize_barcode(barcode);
        }
        if let Some(courier_id) = patch.courier_id.as_mut() {
            *courier_id = courier_id.trim().to_string();
        }
        updated.apply_patch(&patch);
        validate_entry(&updated, &self.registry).map_err(LedgerError::Validation)?;
        Ok(updated)
    }

    /// Apply a partial correction to one entry.
    pub async fn edit(&mut self, id: i32, patch: &ParcelPatch) -> Result<ParcelScanEntry, LedgerError> {
        let updated = self.preview_edit(id, patch).await?;
        if patch.is_empty() {
            return Ok(updated);
        }

        let stored = self
            .backend
            .update(&updated)
            .await
            .map_err(|e| LedgerError::for_row(id, e))?;
        self.store.insert(stored.id, stored.clone());
        info!("Updated missing parcel {} ({})", stored.id, stored.barcode);
        Ok(stored)
    }

    /// Flip recovery state. The recovery date is today when turning on and
    /// cleared when turning off.
    pub async fn toggle_recovered(
        &mut self,
        id: i32,
        recovered: bool,
    ) -> Result<ParcelScanEntry, LedgerError> {
        self.require(id).await?;
        let recovery_date = recovered.then(today);

        let stored = self
            .backend
            .set_recovery(id, recovery_date)
            .await
            .map_err(|e| LedgerError::for_row(id, e))?;
        self.store.insert(stored.id, stored.clone());
        info!(
            "Marked parcel {} as {}",
            stored.barcode,
            if recovered { "recovered" } else { "missing" }
        );
        Ok(stored)
    }

    pub fn get(&self, id: i32) -> Option<&ParcelScanEntry> {
        self.store.get(&id)
    }

    /// All entries in id order.
    pub fn entries(&self) -> impl Iterator<Item = &ParcelScanEntry> {
        self.store.values()
    }

    pub fn entries_for(
        &self,
        date: NaiveDate,
        sub_depot_id: Option<i32>,
    ) -> impl Iterator<Item = &ParcelScanEntry> {
        self.store.values().filter(move |e| {
            e.date_added == date && sub_depot_id.map_or(true, |sd| e.sub_depot_id == sd)
        })
    }

    pub fn unrecovered(&self) -> impl Iterator<Item = &ParcelScanEntry> {
        self.store.values().filter(|e| !e.is_recovered())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Look an entry up in the store, falling back to persistence for rows
    /// created elsewhere since the last load.
    async fn require(&self, id: i32) -> Result<ParcelScanEntry, LedgerError> {
        if let Some(entry) = self.store.get(&id) {
            return Ok(entry.clone());
        }
        self.backend
            .get(id)
            .await?
            .ok_or(LedgerError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, RegistryImport};

    fn registry() -> Arc<RegistrySnapshot> {
        Arc::new(RegistrySnapshot::from_lists(RegistryImport {
            clients: vec![
                Client {
                    id: 1,
                    name: "Amazon".into(),
                    is_high_priority: false,
                    tracking_carrier: None,
                },
                Client {
                    id: 2,
                    name: "ASOS".into(),
                    is_high_priority: true,
                    tracking_carrier: None,
                },
            ],
            ..Default::default()
        }))
    }

    fn ledger() -> (ParcelLedger, Arc<InMemoryLedgerBackend>) {
        let backend = Arc::new(InMemoryLedgerBackend::new());
        (ParcelLedger::new(backend.clone(), registry()), backend)
    }

    fn candidate(barcode: &str, client_id: i32) -> NewParcelEntry {
        NewParcelEntry::standard(barcode, 1, 71, "C001", 3, client_id)
    }

    #[tokio::test]
    async fn test_append_persists_valid_subset() {
        let (mut ledger, backend) = ledger();

        let outcome = ledger
            .append(&[
                candidate("AAAAAAAAAAAAAAA1", 1),
                candidate("SHORT", 1),
                candidate("AAAAAAAAAAAAAAA2", 0),
                candidate("aaaaaaaaaaaaaaa3", 2),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.persisted.len(), 2);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(backend.insert_calls(), 1);
        for entry in &outcome.persisted {
            assert_eq!(entry.barcode.len(), 16);
            assert!(entry.round_id > 0 && entry.client_id > 0);
            assert!(!entry.courier_id.is_empty());
        }
        assert_eq!(outcome.persisted[1].barcode, "AAAAAAAAAAAAAAA3");
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn test_append_with_nothing_valid_skips_persistence() {
        let (mut ledger, backend) = ledger();
        let outcome = ledger.append(&[candidate("BAD", 1)]).await.unwrap();
        assert!(outcome.persisted.is_empty());
        assert_eq!(outcome.skipped, 1);
        assert_eq!(backend.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_toggle_recovered_is_invertible() {
        let (mut ledger, _backend) = ledger();
        let id = ledger
            .append(&[candidate("AAAAAAAAAAAAAAA1", 1)])
            .await
            .unwrap()
            .persisted[0]
            .id;

        let on = ledger.toggle_recovered(id, true).await.unwrap();
        assert!(on.is_recovered());
        assert_eq!(on.recovery_date, Some(today()));
        assert_eq!(ledger.unrecovered().count(), 0);

        let off = ledger.toggle_recovered(id, false).await.unwrap();
        assert!(!off.is_recovered());
        assert_eq!(off.recovery_date, None);
        assert_eq!(ledger.get(id), Some(&off));
    }

    #[tokio::test]
    async fn test_edit_validates_and_upserts() {
        let (mut ledger, _backend) = ledger();
        let id = ledger
            .append(&[candidate("AAAAAAAAAAAAAAA1", 1)])
            .await
            .unwrap()
            .persisted[0]
            .id;

        let err = ledger
            .edit(
                id,
                &ParcelPatch {
                    barcode: Some("TOO-SHORT".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(ledger.get(id).unwrap().barcode, "AAAAAAAAAAAAAAA1");

        let edited = ledger
            .edit(
                id,
                &ParcelPatch {
                    drop_number: Some(14),
                    barcode: Some("bbbbbbbbbbbbbbb1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.drop_number, 14);
        assert_eq!(ledger.get(id).unwrap().barcode, "BBBBBBBBBBBBBBB1");
    }

    #[tokio::test]
    async fn test_persistence_failure_leaves_store_untouched() {
        let (mut ledger, backend) = ledger();
        let id = ledger
            .append(&[candidate("AAAAAAAAAAAAAAA1", 1)])
            .await
            .unwrap()
            .persisted[0]
            .id;

        backend.set_fail_writes(true);
        assert!(matches!(
            ledger.toggle_recovered(id, true).await,
            Err(LedgerError::Database(_))
        ));
        assert!(!ledger.get(id).unwrap().is_recovered());
        assert!(ledger.append(&[candidate("AAAAAAAAAAAAAAA2", 1)]).await.is_err());
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (mut ledger, _backend) = ledger();
        assert!(matches!(
            ledger.toggle_recovered(99, true).await,
            Err(LedgerError::NotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_open_hydrates_from_backend() {
        let backend = Arc::new(InMemoryLedgerBackend::new());
        {
            let mut first = ParcelLedger::new(backend.clone(), registry());
            first
                .append(&[candidate("AAAAAAAAAAAAAAA1", 1), candidate("AAAAAAAAAAAAAAA2", 2)])
                .await
                .unwrap();
        }
        let reopened = ParcelLedger::open(backend, registry()).await.unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(
            reopened
                .entries_for(today(), Some(71))
                .map(|e| e.barcode.as_str())
                .collect::<Vec<_>>(),
            vec!["AAAAAAAAAAAAAAA1", "AAAAAAAAAAAAAAA2"]
        );
    }
}
