//! DUC final report.
//!
//! Three sections are filled in by hand; the missing-parcels section is
//! imported from a frozen recovery snapshot and must be present before the
//! report can be submitted.

use chrono::{DateTime, Utc};

use super::ReportError;
use crate::ledger::RecoverySnapshot;
use crate::models::{DucFinalReport, DucReportDraft, MissingParcelsSummary, Submitter};

/// Whole-percent share of missing parcels that were recovered.
///
/// Zero when nothing went missing.
pub fn recovery_rate(total_missing: u32, unrecovered: u32) -> u32 {
    let recovered = total_missing.saturating_sub(unrecovered);
    let rate = 100.0 * f64::from(recovered) / f64::from(total_missing.max(1));
    rate.round() as u32
}

pub fn compute_missing_summary(snapshot: &RecoverySnapshot) -> MissingParcelsSummary {
    let total_missing = snapshot.total();
    let unrecovered = snapshot.unrecovered();
    MissingParcelsSummary {
        date: snapshot.date,
        total_missing,
        unrecovered,
        recovery_rate: recovery_rate(total_missing, unrecovered),
        imported_at: snapshot.taken_at,
    }
}

/// Turn a draft into a final report. Blocked until the missing-parcels
/// summary has been imported for the draft's date.
pub fn submit(
    draft: &DucReportDraft,
    submitted_by: Submitter,
    submitted_at: DateTime<Utc>,
) -> Result<DucFinalReport, ReportError> {
    let summary = draft
        .missing_summary
        .clone()
        .ok_or(ReportError::SummaryNotImported(draft.date))?;
    if summary.date != draft.date {
        return Err(ReportError::InvalidScope(format!(
            "Missing-parcels summary is for {} but the report is for {}",
            summary.date, draft.date
        )));
    }

    Ok(DucFinalReport {
        date: draft.date,
        failed_rounds: draft.failed_rounds.clone(),
        total_returns: draft.total_returns,
        segregated_parcels: draft.segregated_parcels.clone(),
        missing_summary: summary,
        submitted_by,
        submitted_at,
    })
}
