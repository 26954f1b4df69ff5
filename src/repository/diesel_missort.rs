//! Cage-audit missort repository.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{CageAuditMissortRecord, NewCageAuditMissortRecord};
use super::pool::{DbPool, DieselError};
use super::util::{count_from_db, count_to_db, format_date, parse_date, parse_timestamp};
use crate::models::{CageAuditMissort, NewCageAuditMissort};
use crate::schema::cage_audit_missorts;
use crate::with_conn;

impl TryFrom<CageAuditMissortRecord> for CageAuditMissort {
    type Error = DieselError;

    fn try_from(record: CageAuditMissortRecord) -> Result<Self, Self::Error> {
        Ok(CageAuditMissort {
            id: record.id,
            audit_date: parse_date(&record.audit_date)?,
            sub_depot_id: record.sub_depot_id,
            round_id: record.round_id,
            client_id: record.client_id,
            quantity: count_from_db(record.quantity),
            barcode: record.barcode,
            notes: record.notes,
            recorded_at: parse_timestamp(&record.recorded_at)?,
        })
    }
}

#[derive(Clone)]
pub struct DieselMissortRepository {
    pool: DbPool,
}

impl DieselMissortRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record one audit line. Quantity is clamped to at least 1.
    pub async fn add(&self, missort: &NewCageAuditMissort) -> Result<CageAuditMissort, DieselError> {
        let row = NewCageAuditMissortRecord {
            audit_date: format_date(missort.audit_date),
            sub_depot_id: missort.sub_depot_id,
            round_id: missort.round_id,
            client_id: missort.client_id,
            quantity: count_to_db(missort.quantity.max(1)),
            barcode: missort.barcode.as_deref(),
            notes: missort.notes.as_deref(),
            recorded_at: Utc::now().to_rfc3339(),
        };

        with_conn!(self.pool, conn => {
            diesel::insert_into(cage_audit_missorts::table)
                .values(&row)
                .returning(CageAuditMissortRecord::as_returning())
                .get_result(&mut conn)
                .await
                .and_then(CageAuditMissort::try_from)
        })
    }

    /// Audit lines for a date, in the order they were recorded.
    pub async fn list_for_date(
        &self,
        date: NaiveDate,
        sub_depot_id: Option<i32>,
    ) -> Result<Vec<CageAuditMissort>, DieselError> {
        let day = format_date(date);
        with_conn!(self.pool, conn => {
            let mut query = cage_audit_missorts::table
                .select(CageAuditMissortRecord::as_select())
                .filter(cage_audit_missorts::audit_date.eq(day))
                .order(cage_audit_missorts::id.asc())
                .into_boxed();
            if let Some(sd) = sub_depot_id {
                query = query.filter(cage_audit_missorts::sub_depot_id.eq(sd));
            }
            query
                .load(&mut conn)
                .await?
                .into_iter()
                .map(CageAuditMissort::try_from)
                .collect()
        })
    }
}
