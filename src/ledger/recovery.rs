//! Recovery state changes and frozen recovery snapshots.

use chrono::{DateTime, NaiveDate, Utc};

use super::{LedgerError, ParcelLedger};
use crate::models::ParcelScanEntry;

/// Recovery state of one day's entries at a point in time.
///
/// Reports read this instead of the live ledger so a later toggle cannot
/// change an already imported figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverySnapshot {
    pub date: NaiveDate,
    pub taken_at: DateTime<Utc>,
    /// `(entry id, is_recovered)` in id order.
    pub entries: Vec<(i32, bool)>,
}

impl RecoverySnapshot {
    pub fn from_entries<'a>(
        date: NaiveDate,
        entries: impl IntoIterator<Item = &'a ParcelScanEntry>,
    ) -> Self {
        Self {
            date,
            taken_at: Utc::now(),
            entries: entries
                .into_iter()
                .filter(|e| e.date_added == date)
                .map(|e| (e.id, e.is_recovered()))
                .collect(),
        }
    }

    pub fn total(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }

    pub fn unrecovered(&self) -> u32 {
        u32::try_from(self.entries.iter().filter(|(_, recovered)| !recovered).count())
            .unwrap_or(u32::MAX)
    }
}

/// Thin wrapper over [`ParcelLedger::toggle_recovered`] used by the manual
/// recovery action.
pub struct RecoveryTracker<'a> {
    ledger: &'a mut ParcelLedger,
}

impl<'a> RecoveryTracker<'a> {
    pub fn new(ledger: &'a mut ParcelLedger) -> Self {
        Self { ledger }
    }

    pub async fn mark_recovered(&mut self, id: i32) -> Result<ParcelScanEntry, LedgerError> {
        self.ledger.toggle_recovered(id, true).await
    }

    pub async fn mark_missing(&mut self, id: i32) -> Result<ParcelScanEntry, LedgerError> {
        self.ledger.toggle_recovered(id, false).await
    }

    pub fn snapshot(&self, date: NaiveDate) -> RecoverySnapshot {
        RecoverySnapshot::from_entries(date, self.ledger.entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedgerBackend;
    use crate::models::{today, NewParcelEntry, RegistrySnapshot};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_snapshot_is_frozen() {
        let backend = Arc::new(InMemoryLedgerBackend::new());
        let mut ledger = ParcelLedger::new(backend, Arc::new(RegistrySnapshot::default()));
        let ids: Vec<i32> = ledger
            .append(&[
                NewParcelEntry::standard("AAAAAAAAAAAAAAA1", 1, 71, "C001", 3, 1),
                NewParcelEntry::standard("AAAAAAAAAAAAAAA2", 1, 71, "C001", 3, 1),
            ])
            .await
            .unwrap()
            .persisted
            .iter()
            .map(|e| e.id)
            .collect();

        let mut tracker = RecoveryTracker::new(&mut ledger);
        tracker.mark_recovered(ids[0]).await.unwrap();
        let snapshot = tracker.snapshot(today());
        assert_eq!(snapshot.total(), 2);
        assert_eq!(snapshot.unrecovered(), 1);

        tracker.mark_missing(ids[0]).await.unwrap();
        assert_eq!(snapshot.unrecovered(), 1);
        assert_eq!(tracker.snapshot(today()).unrecovered(), 2);
    }
}
