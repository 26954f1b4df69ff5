//! Diesel-based missing-parcel repository for SQLite.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! while maintaining Diesel's compile-time query checking.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::diesel_models::{MissingParcelChanges, MissingParcelRecord, NewMissingParcel};
use super::pool::{DbPool, DieselError};
use super::util::{format_date, parse_date, parse_date_opt, parse_timestamp};
use crate::ledger::LedgerBackend;
use crate::models::{ParcelScanEntry, ScanType};
use crate::schema::missing_parcels;
use crate::with_conn;

/// Convert a database record to a domain model.
///
/// Rows whose scan-type references or recovery columns disagree with each
/// other are rejected rather than silently repaired.
impl TryFrom<MissingParcelRecord> for ParcelScanEntry {
    type Error = DieselError;

    fn try_from(record: MissingParcelRecord) -> Result<Self, Self::Error> {
        let scan_type = ScanType::from_parts(
            &record.scan_type,
            record.cfwd_courier_id,
            record.misrouted_du_id,
            record.rejected_courier_id,
        )
        .ok_or_else(|| {
            DieselError::DeserializationError(
                format!(
                    "Inconsistent scan type '{}' on parcel {}",
                    record.scan_type, record.id
                )
                .into(),
            )
        })?;

        let recovery_date = parse_date_opt(record.recovery_date.as_deref())?;
        if record.is_recovered != recovery_date.is_some() {
            return Err(DieselError::DeserializationError(
                format!("Inconsistent recovery state on parcel {}", record.id).into(),
            ));
        }

        Ok(ParcelScanEntry {
            id: record.id,
            barcode: record.barcode,
            round_id: record.round_id,
            drop_number: record.drop_number,
            sub_depot_id: record.sub_depot_id,
            courier_id: record.courier_id,
            sorter_team_member_id: record.sorter_team_member_id,
            client_id: record.client_id,
            time_scanned: parse_timestamp(&record.time_scanned)?,
            scan_type,
            recovery_date,
            date_added: parse_date(&record.date_added)?,
        })
    }
}

fn new_row(entry: &ParcelScanEntry) -> NewMissingParcel<'_> {
    NewMissingParcel {
        barcode: &entry.barcode,
        round_id: entry.round_id,
        drop_number: entry.drop_number,
        sub_depot_id: entry.sub_depot_id,
        courier_id: &entry.courier_id,
        sorter_team_member_id: entry.sorter_team_member_id,
        client_id: entry.client_id,
        time_scanned: entry.time_scanned.to_rfc3339(),
        scan_type: entry.scan_type.as_str(),
        cfwd_courier_id: entry.scan_type.cfwd_courier_id(),
        misrouted_du_id: entry.scan_type.misrouted_du_id(),
        rejected_courier_id: entry.scan_type.rejected_courier_id(),
        is_recovered: entry.is_recovered(),
        recovery_date: entry.recovery_date.map(format_date),
        date_added: format_date(entry.date_added),
    }
}

fn changes(entry: &ParcelScanEntry) -> MissingParcelChanges<'_> {
    MissingParcelChanges {
        barcode: &entry.barcode,
        round_id: entry.round_id,
        drop_number: entry.drop_number,
        sub_depot_id: entry.sub_depot_id,
        courier_id: &entry.courier_id,
        sorter_team_member_id: entry.sorter_team_member_id,
        client_id: entry.client_id,
        time_scanned: entry.time_scanned.to_rfc3339(),
        scan_type: entry.scan_type.as_str(),
        cfwd_courier_id: entry.scan_type.cfwd_courier_id(),
        misrouted_du_id: entry.scan_type.misrouted_du_id(),
        rejected_courier_id: entry.scan_type.rejected_courier_id(),
    }
}

fn into_entries(records: Vec<MissingParcelRecord>) -> Result<Vec<ParcelScanEntry>, DieselError> {
    records.into_iter().map(ParcelScanEntry::try_from).collect()
}

/// Diesel-based missing-parcel repository.
#[derive(Clone)]
pub struct DieselParcelRepository {
    pool: DbPool,
}

impl DieselParcelRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerBackend for DieselParcelRepository {
    async fn insert_batch(
        &self,
        entries: &[ParcelScanEntry],
    ) -> Result<Vec<ParcelScanEntry>, DieselError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<NewMissingParcel<'_>> = entries.iter().map(new_row).collect();

        // Row by row inside one transaction: the batch lands whole or not at all
        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    let mut inserted = Vec::with_capacity(rows.len());
                    for row in &rows {
                        let record = diesel::insert_into(missing_parcels::table)
                            .values(row)
                            .returning(MissingParcelRecord::as_returning())
                            .get_result(conn)
                            .await?;
                        inserted.push(ParcelScanEntry::try_from(record)?);
                    }
                    Ok::<_, DieselError>(inserted)
                })
            })
            .await
        })
    }

    async fn update(&self, entry: &ParcelScanEntry) -> Result<ParcelScanEntry, DieselError> {
        let changes = changes(entry);
        with_conn!(self.pool, conn => {
            diesel::update(missing_parcels::table.find(entry.id))
                .set(&changes)
                .returning(MissingParcelRecord::as_returning())
                .get_result(&mut conn)
                .await
                .and_then(ParcelScanEntry::try_from)
        })
    }

    async fn set_recovery(
        &self,
        id: i32,
        recovery_date: Option<NaiveDate>,
    ) -> Result<ParcelScanEntry, DieselError> {
        with_conn!(self.pool, conn => {
            diesel::update(missing_parcels::table.find(id))
                .set((
                    missing_parcels::is_recovered.eq(recovery_date.is_some()),
                    missing_parcels::recovery_date.eq(recovery_date.map(format_date)),
                ))
                .returning(MissingParcelRecord::as_returning())
                .get_result(&mut conn)
                .await
                .and_then(ParcelScanEntry::try_from)
        })
    }

    async fn get(&self, id: i32) -> Result<Option<ParcelScanEntry>, DieselError> {
        with_conn!(self.pool, conn => {
            missing_parcels::table
                .find(id)
                .select(MissingParcelRecord::as_select())
                .first(&mut conn)
                .await
                .optional()
                .and_then(|opt| opt.map(ParcelScanEntry::try_from).transpose())
        })
    }

    async fn list(&self) -> Result<Vec<ParcelScanEntry>, DieselError> {
        with_conn!(self.pool, conn => {
            missing_parcels::table
                .order(missing_parcels::id.asc())
                .select(MissingParcelRecord::as_select())
                .load(&mut conn)
                .await
                .and_then(into_entries)
        })
    }

    /// Entries logged on a given day, optionally for one sub-depot.
    async fn list_for_date(
        &self,
        date: NaiveDate,
        sub_depot_id: Option<i32>,
    ) -> Result<Vec<ParcelScanEntry>, DieselError> {
        let day = format_date(date);
        with_conn!(self.pool, conn => {
            let mut query = missing_parcels::table
                .select(MissingParcelRecord::as_select())
                .filter(missing_parcels::date_added.eq(day))
                .order(missing_parcels::id.asc())
                .into_boxed();
            if let Some(sd) = sub_depot_id {
                query = query.filter(missing_parcels::sub_depot_id.eq(sd));
            }
            query
                .load(&mut conn)
                .await
                .and_then(into_entries)
        })
    }
}
