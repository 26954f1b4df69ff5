//! Missorts found during physical cage audits.
//!
//! This is a separate dataset from the missing-parcel ledger: a missort is a
//! parcel sitting in the wrong cage, not a parcel that failed delivery.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CageAuditMissort {
    pub id: i32,
    pub audit_date: NaiveDate,
    pub sub_depot_id: i32,
    pub round_id: i32,
    pub client_id: i32,
    /// Number of parcels this audit line stands for.
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Audit line as entered by an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCageAuditMissort {
    pub audit_date: NaiveDate,
    pub sub_depot_id: i32,
    pub round_id: i32,
    pub client_id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_quantity() -> u32 {
    1
}
