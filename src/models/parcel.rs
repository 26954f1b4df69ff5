//! Missing-parcel scan records.
//!
//! A scan entry is created once per undelivered parcel and afterwards only
//! corrected (edit) or flipped between missing and recovered.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Every barcode in the ledger has exactly this many characters.
pub const BARCODE_LEN: usize = 16;

/// How the parcel came to be scanned as undelivered.
///
/// Each variant carries exactly the extra reference its scan type needs, so
/// a carry-forward entry can never hold a misrouted delivery unit and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanType {
    Standard,
    Misrouted { delivery_unit_id: i32 },
    Rejected { courier_id: String },
    CarryForward { courier_id: String },
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Misrouted { .. } => "misrouted",
            Self::Rejected { .. } => "rejected",
            Self::CarryForward { .. } => "carry_forward",
        }
    }

    /// Rebuild a scan type from its flattened storage columns.
    ///
    /// Returns `None` when the kind is unknown, when the reference the kind
    /// requires is missing, or when a reference belonging to another kind
    /// is populated.
    pub fn from_parts(
        kind: &str,
        cfwd_courier_id: Option<String>,
        misrouted_du_id: Option<i32>,
        rejected_courier_id: Option<String>,
    ) -> Option<Self> {
        match (kind, cfwd_courier_id, misrouted_du_id, rejected_courier_id) {
            ("standard", None, None, None) => Some(Self::Standard),
            ("misrouted", None, Some(du), None) => Some(Self::Misrouted {
                delivery_unit_id: du,
            }),
            ("rejected", None, None, Some(courier_id)) => Some(Self::Rejected { courier_id }),
            ("carry_forward", Some(courier_id), None, None) => {
                Some(Self::CarryForward { courier_id })
            }
            _ => None,
        }
    }

    pub fn cfwd_courier_id(&self) -> Option<&str> {
        match self {
            Self::CarryForward { courier_id } => Some(courier_id),
            _ => None,
        }
    }

    pub fn misrouted_du_id(&self) -> Option<i32> {
        match self {
            Self::Misrouted { delivery_unit_id } => Some(*delivery_unit_id),
            _ => None,
        }
    }

    pub fn rejected_courier_id(&self) -> Option<&str> {
        match self {
            Self::Rejected { courier_id } => Some(courier_id),
            _ => None,
        }
    }
}

/// A scanned-but-undelivered parcel in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelScanEntry {
    /// Database row ID.
    pub id: i32,
    /// Normalized 16-character barcode.
    pub barcode: String,
    pub round_id: i32,
    pub drop_number: i32,
    pub sub_depot_id: i32,
    pub courier_id: String,
    /// Team member who sorted the parcel.
    pub sorter_team_member_id: i32,
    pub client_id: i32,
    pub time_scanned: DateTime<Utc>,
    pub scan_type: ScanType,
    /// Day the parcel was recovered. `None` while the parcel is missing.
    pub recovery_date: Option<NaiveDate>,
    /// Calendar day the entry belongs to, used for daily grouping.
    pub date_added: NaiveDate,
}

impl ParcelScanEntry {
    pub fn is_recovered(&self) -> bool {
        self.recovery_date.is_some()
    }

    /// Apply a partial correction. Recovery state is never touched here.
    pub fn apply_patch(&mut self, patch: &ParcelPatch) {
        if let Some(ref barcode) = patch.barcode {
            self.barcode = barcode.clone();
        }
        if let Some(round_id) = patch.round_id {
            self.round_id = round_id;
        }
        if let Some(drop_number) = patch.drop_number {
            self.drop_number = drop_number;
        }
        if let Some(sub_depot_id) = patch.sub_depot_id {
            self.sub_depot_id = sub_depot_id;
        }
        if let Some(ref courier_id) = patch.courier_id {
            self.courier_id = courier_id.clone();
        }
        if let Some(sorter) = patch.sorter_team_member_id {
            self.sorter_team_member_id = sorter;
        }
        if let Some(client_id) = patch.client_id {
            self.client_id = client_id;
        }
        if let Some(time_scanned) = patch.time_scanned {
            self.time_scanned = time_scanned;
        }
        if let Some(ref scan_type) = patch.scan_type {
            self.scan_type = scan_type.clone();
        }
    }
}

/// Operator input for a new ledger entry, before validation.
///
/// Missing numeric references deserialize to zero and missing courier ids to
/// an empty string so validation can report them instead of the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParcelEntry {
    pub barcode: String,
    #[serde(default)]
    pub round_id: i32,
    #[serde(default)]
    pub drop_number: i32,
    #[serde(default)]
    pub sub_depot_id: i32,
    #[serde(default)]
    pub courier_id: String,
    #[serde(default)]
    pub sorter_team_member_id: i32,
    #[serde(default)]
    pub client_id: i32,
    #[serde(default)]
    pub time_scanned: Option<DateTime<Utc>>,
    #[serde(default = "default_scan_type")]
    pub scan_type: ScanType,
    /// Log the parcel as already recovered.
    #[serde(default)]
    pub recovered: bool,
    /// Defaults to today.
    #[serde(default)]
    pub date_added: Option<NaiveDate>,
}

fn default_scan_type() -> ScanType {
    ScanType::Standard
}

impl NewParcelEntry {
    /// Minimal standard-scan candidate; the remaining fields take defaults.
    pub fn standard(
        barcode: &str,
        round_id: i32,
        sub_depot_id: i32,
        courier_id: &str,
        sorter_team_member_id: i32,
        client_id: i32,
    ) -> Self {
        Self {
            barcode: barcode.to_string(),
            round_id,
            drop_number: 0,
            sub_depot_id,
            courier_id: courier_id.to_string(),
            sorter_team_member_id,
            client_id,
            time_scanned: None,
            scan_type: ScanType::Standard,
            recovered: false,
            date_added: None,
        }
    }

    pub fn date_added_or_today(&self) -> NaiveDate {
        self.date_added.unwrap_or_else(today)
    }
}

/// Partial update applied by an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_number: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_depot_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorter_team_member_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_scanned: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_type: Option<ScanType>,
}

impl ParcelPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The depot's calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
