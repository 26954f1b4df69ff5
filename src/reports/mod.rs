//! Reconciliation of the ledger into dated report snapshots.
//!
//! The aggregations themselves are pure functions of (ledger rows,
//! registries, scope). [`ReportService`] feeds them from storage and commits
//! the results as submitter-attributed snapshots under their natural key.
//! Nothing here ever writes to the ledger.

pub mod cage_return;
pub mod duc;
pub mod missort_summary;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::ledger::{LedgerBackend, RecoverySnapshot};
use crate::models::{
    CageReturnReport, CageReturnSheet, DailyMissortSummaryReport, DucFinalReport, DucReportDraft,
    MissingParcelsSummary, MissortSummary, RoundCourierPair, Submitter,
};
use crate::repository::{DbContext, DieselError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Import the missing-parcels summary for {0} before submitting")]
    SummaryNotImported(NaiveDate),
    #[error("{0}")]
    InvalidScope(String),
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
}

/// Operator's cage return marks for one date and sub-depot.
#[derive(Debug, Clone, Deserialize)]
pub struct CageReturnSubmission {
    pub date: NaiveDate,
    pub sub_depot_id: i32,
    #[serde(default)]
    pub non_returns: Vec<RoundCourierPair>,
    #[serde(default)]
    pub notes: String,
    pub submitted_by: Submitter,
}

fn check_submitter(submitter: &Submitter) -> Result<(), ReportError> {
    if submitter.id <= 0 || submitter.name.trim().is_empty() {
        return Err(ReportError::InvalidScope(
            "A submitter id and name are required".to_string(),
        ));
    }
    Ok(())
}

fn check_sub_depot(sub_depot_id: i32) -> Result<(), ReportError> {
    if sub_depot_id <= 0 {
        return Err(ReportError::InvalidScope(
            "A sub-depot is required".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ReportService {
    ctx: DbContext,
}

impl ReportService {
    pub fn new(ctx: DbContext) -> Self {
        Self { ctx }
    }

    pub async fn missort_summary(
        &self,
        date: NaiveDate,
        sub_depot_id: Option<i32>,
    ) -> Result<MissortSummary, ReportError> {
        let missort_repo = self.ctx.missorts();
        let registries = self.ctx.registries();
        let (missorts, registry) = tokio::try_join!(
            missort_repo.list_for_date(date, sub_depot_id),
            registries.snapshot(),
        )?;
        Ok(missort_summary::compute(
            date,
            sub_depot_id,
            &missorts,
            &registry,
        ))
    }

    /// Regenerate the summary and store it under its natural key.
    pub async fn save_missort_summary(
        &self,
        date: NaiveDate,
        sub_depot_id: Option<i32>,
        submitted_by: Submitter,
    ) -> Result<DailyMissortSummaryReport, ReportError> {
        check_submitter(&submitted_by)?;
        let summary = self.missort_summary(date, sub_depot_id).await?;
        let report = DailyMissortSummaryReport {
            summary,
            submitted_by,
            submitted_at: Utc::now(),
        };
        self.ctx.reports().save_missort_summary(&report).await?;
        Ok(report)
    }

    pub async fn saved_missort_summary(
        &self,
        date: NaiveDate,
        sub_depot_id: Option<i32>,
    ) -> Result<Option<DailyMissortSummaryReport>, ReportError> {
        Ok(self
            .ctx
            .reports()
            .get_missort_summary(date, sub_depot_id)
            .await?)
    }

    /// Open the cage return sheet, pre-checked from any saved report.
    pub async fn open_cage_return(
        &self,
        date: NaiveDate,
        sub_depot_id: i32,
    ) -> Result<CageReturnSheet, ReportError> {
        check_sub_depot(sub_depot_id)?;
        let parcels = self.ctx.parcels();
        let reports = self.ctx.reports();
        let registries = self.ctx.registries();
        let (entries, saved, registry) = tokio::try_join!(
            parcels.list_for_date(date, Some(sub_depot_id)),
            reports.get_cage_return(date, sub_depot_id),
            registries.snapshot(),
        )?;
        Ok(cage_return::open_sheet(
            date,
            sub_depot_id,
            &entries,
            saved.as_ref(),
            &registry,
        ))
    }

    /// Store the submitted non-returns. Marks must name pairs on the sheet.
    pub async fn save_cage_return(
        &self,
        submission: CageReturnSubmission,
    ) -> Result<CageReturnReport, ReportError> {
        check_submitter(&submission.submitted_by)?;
        let mut sheet = self
            .open_cage_return(submission.date, submission.sub_depot_id)
            .await?;

        for line in sheet.lines.iter_mut() {
            line.not_returned = false;
        }
        for pair in &submission.non_returns {
            if !sheet.set_not_returned(pair.round_id, &pair.courier_id, true) {
                warn!(
                    "Rejected cage return mark for round {} / courier {}",
                    pair.round_id, pair.courier_id
                );
                return Err(ReportError::InvalidScope(format!(
                    "Round {} with courier {} has no missing parcels on {} for sub-depot {}",
                    pair.round_id, pair.courier_id, submission.date, submission.sub_depot_id
                )));
            }
        }
        sheet.notes = submission.notes;

        let report = cage_return::finalize(&sheet, submission.submitted_by, Utc::now());
        self.ctx.reports().save_cage_return(&report).await?;
        Ok(report)
    }

    /// Compute the DUC missing-parcels section from a frozen recovery
    /// snapshot of the day's ledger entries.
    pub async fn import_missing_summary(
        &self,
        date: NaiveDate,
    ) -> Result<MissingParcelsSummary, ReportError> {
        let entries = self.ctx.parcels().list_for_date(date, None).await?;
        let snapshot = RecoverySnapshot::from_entries(date, &entries);
        let summary = duc::compute_missing_summary(&snapshot);
        info!(
            "Imported missing-parcels summary for {}: {} missing, {} unrecovered",
            date, summary.total_missing, summary.unrecovered
        );
        Ok(summary)
    }

    pub async fn submit_duc(
        &self,
        draft: &DucReportDraft,
        submitted_by: Submitter,
    ) -> Result<DucFinalReport, ReportError> {
        check_submitter(&submitted_by)?;
        let report = duc::submit(draft, submitted_by, Utc::now())?;
        self.ctx.reports().save_duc(&report).await?;
        Ok(report)
    }

    pub async fn duc_report(&self, date: NaiveDate) -> Result<Option<DucFinalReport>, ReportError> {
        Ok(self.ctx.reports().get_duc(date).await?)
    }
}
