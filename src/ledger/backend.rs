//! Pluggable persistence for the missing-parcel ledger.
//!
//! The ledger never talks to storage directly; it goes through this trait so
//! the Diesel repository can be swapped for an in-memory backend in tests.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::ParcelScanEntry;
use crate::repository::DieselError;

#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Persist a batch of new entries in one call. Ids on the input are
    /// ignored; the returned entries carry the assigned ids.
    async fn insert_batch(
        &self,
        entries: &[ParcelScanEntry],
    ) -> Result<Vec<ParcelScanEntry>, DieselError>;

    /// Overwrite every non-recovery field of an existing entry.
    async fn update(&self, entry: &ParcelScanEntry) -> Result<ParcelScanEntry, DieselError>;

    /// Set or clear the recovery date of an entry.
    async fn set_recovery(
        &self,
        id: i32,
        recovery_date: Option<NaiveDate>,
    ) -> Result<ParcelScanEntry, DieselError>;

    async fn get(&self, id: i32) -> Result<Option<ParcelScanEntry>, DieselError>;

    async fn list(&self) -> Result<Vec<ParcelScanEntry>, DieselError>;

    async fn list_for_date(
        &self,
        date: NaiveDate,
        sub_depot_id: Option<i32>,
    ) -> Result<Vec<ParcelScanEntry>, DieselError>;
}
