//! Dated report snapshots produced by reconciliation.
//!
//! Each snapshot is stored under a natural key (the report date, optionally
//! with a sub-depot). Saving again under the same key replaces the snapshot;
//! the ledger that produced it is never touched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Who submitted a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submitter {
    pub id: i32,
    pub name: String,
}

/// Natural key for a dated, optionally sub-depot scoped report.
pub fn report_key(date: NaiveDate, sub_depot_id: Option<i32>) -> String {
    match sub_depot_id {
        Some(sd) => format!("{}/{}", date.format("%Y-%m-%d"), sd),
        None => date.format("%Y-%m-%d").to_string(),
    }
}

// --- Daily missort summary ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMissortCount {
    pub client_id: i32,
    pub client_name: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundMissortCount {
    pub round_id: i32,
    pub round_name: String,
    pub sub_depot_id: i32,
    pub count: u32,
}

/// Computed missort rollup for one date (and optionally one sub-depot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissortSummary {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_depot_id: Option<i32>,
    pub total_missorts: u32,
    pub missorts_by_client: Vec<ClientMissortCount>,
    pub missorts_by_round: Vec<RoundMissortCount>,
}

impl MissortSummary {
    pub fn key(&self) -> String {
        report_key(self.date, self.sub_depot_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMissortSummaryReport {
    #[serde(flatten)]
    pub summary: MissortSummary,
    pub submitted_by: Submitter,
    pub submitted_at: DateTime<Utc>,
}

// --- Cage return ---

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundCourierPair {
    pub round_id: i32,
    pub courier_id: String,
}

impl RoundCourierPair {
    pub fn new(round_id: i32, courier_id: &str) -> Self {
        Self {
            round_id,
            courier_id: courier_id.to_string(),
        }
    }
}

/// One row of the cage return sheet. Unchecked means the cage came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CageReturnLine {
    pub round_id: i32,
    pub round_name: String,
    pub courier_id: String,
    pub courier_name: String,
    pub not_returned: bool,
}

impl CageReturnLine {
    pub fn pair(&self) -> RoundCourierPair {
        RoundCourierPair::new(self.round_id, &self.courier_id)
    }
}

/// Editable cage return sheet for one date and sub-depot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CageReturnSheet {
    pub date: NaiveDate,
    pub sub_depot_id: i32,
    pub lines: Vec<CageReturnLine>,
    #[serde(default)]
    pub notes: String,
    /// Whether the checked state came from a saved snapshot.
    #[serde(default)]
    pub from_snapshot: bool,
}

impl CageReturnSheet {
    /// Mark or unmark a pair as not returned. Returns false for unknown pairs.
    pub fn set_not_returned(&mut self, round_id: i32, courier_id: &str, not_returned: bool) -> bool {
        match self
            .lines
            .iter_mut()
            .find(|l| l.round_id == round_id && l.courier_id == courier_id)
        {
            Some(line) => {
                line.not_returned = not_returned;
                true
            }
            None => false,
        }
    }

    pub fn non_returns(&self) -> Vec<RoundCourierPair> {
        self.lines
            .iter()
            .filter(|l| l.not_returned)
            .map(CageReturnLine::pair)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CageReturnReport {
    pub date: NaiveDate,
    pub sub_depot_id: i32,
    pub non_returns: Vec<RoundCourierPair>,
    #[serde(default)]
    pub notes: String,
    pub submitted_by: Submitter,
    pub submitted_at: DateTime<Utc>,
}

impl CageReturnReport {
    pub fn key(&self) -> String {
        report_key(self.date, Some(self.sub_depot_id))
    }
}

// --- DUC final report ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRound {
    pub round_id: i32,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegregatedParcel {
    pub barcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i32>,
    #[serde(default)]
    pub reason: String,
}

/// Ledger-derived section of the DUC report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingParcelsSummary {
    pub date: NaiveDate,
    pub total_missing: u32,
    pub unrecovered: u32,
    /// Whole percent, 0..=100.
    pub recovery_rate: u32,
    pub imported_at: DateTime<Utc>,
}

/// DUC report while it is being filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DucReportDraft {
    pub date: NaiveDate,
    #[serde(default)]
    pub failed_rounds: Vec<FailedRound>,
    #[serde(default)]
    pub total_returns: u32,
    #[serde(default)]
    pub segregated_parcels: Vec<SegregatedParcel>,
    /// Must be imported before the draft can be submitted.
    #[serde(default)]
    pub missing_summary: Option<MissingParcelsSummary>,
}

impl DucReportDraft {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            failed_rounds: Vec::new(),
            total_returns: 0,
            segregated_parcels: Vec::new(),
            missing_summary: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DucFinalReport {
    pub date: NaiveDate,
    pub failed_rounds: Vec<FailedRound>,
    pub total_returns: u32,
    pub segregated_parcels: Vec<SegregatedParcel>,
    pub missing_summary: MissingParcelsSummary,
    pub submitted_by: Submitter,
    pub submitted_at: DateTime<Utc>,
}

impl DucFinalReport {
    pub fn key(&self) -> String {
        report_key(self.date, None)
    }
}
