//! Report snapshot repository.
//!
//! Snapshots are upserted under their natural key with `replace_into`, so
//! saving twice for the same scope leaves a single row. List-valued sections
//! are stored as JSON text.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::info;

use super::diesel_models::{CageReturnReportRecord, DailyMissortReportRecord, DucReportRecord};
use super::pool::{DbPool, DieselError};
use super::util::{
    count_from_db, count_to_db, format_date, from_json_column, parse_date, parse_timestamp,
    to_json_column,
};
use crate::models::{
    report_key, CageReturnReport, DailyMissortSummaryReport, DucFinalReport,
    MissingParcelsSummary, MissortSummary, Submitter,
};
use crate::schema::{cage_return_reports, daily_missort_reports, duc_reports};
use crate::with_conn;

fn submitter(id: i32, name: String) -> Submitter {
    Submitter { id, name }
}

impl TryFrom<DailyMissortReportRecord> for DailyMissortSummaryReport {
    type Error = DieselError;

    fn try_from(r: DailyMissortReportRecord) -> Result<Self, Self::Error> {
        Ok(DailyMissortSummaryReport {
            summary: MissortSummary {
                date: parse_date(&r.report_date)?,
                sub_depot_id: r.sub_depot_id,
                total_missorts: count_from_db(r.total_missorts),
                missorts_by_client: from_json_column(&r.missorts_by_client)?,
                missorts_by_round: from_json_column(&r.missorts_by_round)?,
            },
            submitted_by: submitter(r.submitted_by_id, r.submitted_by_name),
            submitted_at: parse_timestamp(&r.submitted_at)?,
        })
    }
}

impl TryFrom<&DailyMissortSummaryReport> for DailyMissortReportRecord {
    type Error = DieselError;

    fn try_from(report: &DailyMissortSummaryReport) -> Result<Self, Self::Error> {
        let summary = &report.summary;
        Ok(DailyMissortReportRecord {
            report_key: summary.key(),
            report_date: format_date(summary.date),
            sub_depot_id: summary.sub_depot_id,
            total_missorts: count_to_db(summary.total_missorts),
            missorts_by_client: to_json_column(&summary.missorts_by_client)?,
            missorts_by_round: to_json_column(&summary.missorts_by_round)?,
            submitted_by_id: report.submitted_by.id,
            submitted_by_name: report.submitted_by.name.clone(),
            submitted_at: report.submitted_at.to_rfc3339(),
        })
    }
}

impl TryFrom<CageReturnReportRecord> for CageReturnReport {
    type Error = DieselError;

    fn try_from(r: CageReturnReportRecord) -> Result<Self, Self::Error> {
        Ok(CageReturnReport {
            date: parse_date(&r.report_date)?,
            sub_depot_id: r.sub_depot_id,
            non_returns: from_json_column(&r.non_returns)?,
            notes: r.notes,
            submitted_by: submitter(r.submitted_by_id, r.submitted_by_name),
            submitted_at: parse_timestamp(&r.submitted_at)?,
        })
    }
}

impl TryFrom<&CageReturnReport> for CageReturnReportRecord {
    type Error = DieselError;

    fn try_from(report: &CageReturnReport) -> Result<Self, Self::Error> {
        Ok(CageReturnReportRecord {
            report_key: report.key(),
            report_date: format_date(report.date),
            sub_depot_id: report.sub_depot_id,
            non_returns: to_json_column(&report.non_returns)?,
            notes: report.notes.clone(),
            submitted_by_id: report.submitted_by.id,
            submitted_by_name: report.submitted_by.name.clone(),
            submitted_at: report.submitted_at.to_rfc3339(),
        })
    }
}

impl TryFrom<DucReportRecord> for DucFinalReport {
    type Error = DieselError;

    fn try_from(r: DucReportRecord) -> Result<Self, Self::Error> {
        let date = parse_date(&r.report_date)?;
        Ok(DucFinalReport {
            date,
            failed_rounds: from_json_column(&r.failed_rounds)?,
            total_returns: count_from_db(r.total_returns),
            segregated_parcels: from_json_column(&r.segregated_parcels)?,
            missing_summary: MissingParcelsSummary {
                date,
                total_missing: count_from_db(r.total_missing),
                unrecovered: count_from_db(r.unrecovered),
                recovery_rate: count_from_db(r.recovery_rate),
                imported_at: parse_timestamp(&r.summary_imported_at)?,
            },
            submitted_by: submitter(r.submitted_by_id, r.submitted_by_name),
            submitted_at: parse_timestamp(&r.submitted_at)?,
        })
    }
}

impl TryFrom<&DucFinalReport> for DucReportRecord {
    type Error = DieselError;

    fn try_from(report: &DucFinalReport) -> Result<Self, Self::Error> {
        let summary = &report.missing_summary;
        Ok(DucReportRecord {
            report_date: format_date(report.date),
            failed_rounds: to_json_column(&report.failed_rounds)?,
            total_returns: count_to_db(report.total_returns),
            segregated_parcels: to_json_column(&report.segregated_parcels)?,
            total_missing: count_to_db(summary.total_missing),
            unrecovered: count_to_db(summary.unrecovered),
            recovery_rate: count_to_db(summary.recovery_rate),
            summary_imported_at: summary.imported_at.to_rfc3339(),
            submitted_by_id: report.submitted_by.id,
            submitted_by_name: report.submitted_by.name.clone(),
            submitted_at: report.submitted_at.to_rfc3339(),
        })
    }
}

#[derive(Clone)]
pub struct DieselReportRepository {
    pool: DbPool,
}

impl DieselReportRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn save_missort_summary(
        &self,
        report: &DailyMissortSummaryReport,
    ) -> Result<(), DieselError> {
        let record = DailyMissortReportRecord::try_from(report)?;
        with_conn!(self.pool, conn => {
            diesel::replace_into(daily_missort_reports::table)
                .values(&record)
                .execute(&mut conn)
                .await?;
        });
        info!("Saved missort summary {}", record.report_key);
        Ok(())
    }

    pub async fn get_missort_summary(
        &self,
        date: NaiveDate,
        sub_depot_id: Option<i32>,
    ) -> Result<Option<DailyMissortSummaryReport>, DieselError> {
        let key = report_key(date, sub_depot_id);
        with_conn!(self.pool, conn => {
            daily_missort_reports::table
                .find(key)
                .select(DailyMissortReportRecord::as_select())
                .first(&mut conn)
                .await
                .optional()?
                .map(DailyMissortSummaryReport::try_from)
                .transpose()
        })
    }

    pub async fn save_cage_return(&self, report: &CageReturnReport) -> Result<(), DieselError> {
        let record = CageReturnReportRecord::try_from(report)?;
        with_conn!(self.pool, conn => {
            diesel::replace_into(cage_return_reports::table)
                .values(&record)
                .execute(&mut conn)
                .await?;
        });
        info!(
            "Saved cage return report {} ({} non-returns)",
            record.report_key,
            report.non_returns.len()
        );
        Ok(())
    }

    pub async fn get_cage_return(
        &self,
        date: NaiveDate,
        sub_depot_id: i32,
    ) -> Result<Option<CageReturnReport>, DieselError> {
        let key = report_key(date, Some(sub_depot_id));
        with_conn!(self.pool, conn => {
            cage_return_reports::table
                .find(key)
                .select(CageReturnReportRecord::as_select())
                .first(&mut conn)
                .await
                .optional()?
                .map(CageReturnReport::try_from)
                .transpose()
        })
    }

    pub async fn save_duc(&self, report: &DucFinalReport) -> Result<(), DieselError> {
        let record = DucReportRecord::try_from(report)?;
        with_conn!(self.pool, conn => {
            diesel::replace_into(duc_reports::table)
                .values(&record)
                .execute(&mut conn)
                .await?;
        });
        info!("Saved DUC report {}", record.report_date);
        Ok(())
    }

    pub async fn get_duc(&self, date: NaiveDate) -> Result<Option<DucFinalReport>, DieselError> {
        let key = format_date(date);
        with_conn!(self.pool, conn => {
            duc_reports::table
                .find(key)
                .select(DucReportRecord::as_select())
                .first(&mut conn)
                .await
                .optional()?
                .map(DucFinalReport::try_from)
                .transpose()
        })
    }
}
