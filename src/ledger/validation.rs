//! Input checks applied before anything reaches persistence.
//!
//! Errors are plain operator-facing messages; the ledger wraps them in
//! [`LedgerError::Validation`](super::LedgerError::Validation) for single
//! records and logs-and-skips them for batches.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::models::{
    today, NewParcelEntry, ParcelScanEntry, RegistrySnapshot, ScanType, BARCODE_LEN,
};

static BARCODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{16}$").expect("barcode pattern is valid"));

/// Trim and upper-case a scanned barcode.
pub fn normalize_barcode(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

pub fn check_barcode(barcode: &str) -> Result<(), String> {
    if BARCODE_PATTERN.is_match(barcode) {
        Ok(())
    } else {
        Err(format!(
            "Barcode must be exactly {} letters or digits, got '{}'",
            BARCODE_LEN, barcode
        ))
    }
}

/// Check a complete entry against the required-field rules and, where the
/// registry list is loaded, against the registry itself.
pub fn validate_entry(entry: &ParcelScanEntry, registry: &RegistrySnapshot) -> Result<(), String> {
    check_barcode(&entry.barcode)?;

    if entry.round_id <= 0 {
        return Err("Round is required".to_string());
    }
    if entry.courier_id.trim().is_empty() {
        return Err("Courier is required".to_string());
    }
    if entry.sorter_team_member_id <= 0 {
        return Err("Sorter is required".to_string());
    }
    if entry.client_id <= 0 {
        return Err("Client is required".to_string());
    }

    match &entry.scan_type {
        ScanType::Standard => {}
        ScanType::Misrouted { delivery_unit_id } if *delivery_unit_id <= 0 => {
            return Err("Misrouted parcels need a delivery unit".to_string());
        }
        ScanType::Rejected { courier_id } | ScanType::CarryForward { courier_id }
            if courier_id.trim().is_empty() =>
        {
            return Err(format!(
                "{} parcels need a courier",
                scan_type_label(&entry.scan_type)
            ));
        }
        _ => {}
    }

    if !registry.clients.is_empty() && !registry.clients.contains_key(&entry.client_id) {
        return Err(format!("Unknown client {}", entry.client_id));
    }
    if !registry.couriers.is_empty() && !registry.couriers.contains_key(&entry.courier_id) {
        return Err(format!("Unknown courier {}", entry.courier_id));
    }
    if !registry.rounds.is_empty() && !registry.rounds.contains_key(&entry.round_id) {
        return Err(format!("Unknown round {}", entry.round_id));
    }
    if !registry.team_members.is_empty()
        && !registry.team_members.contains_key(&entry.sorter_team_member_id)
    {
        return Err(format!("Unknown sorter {}", entry.sorter_team_member_id));
    }

    Ok(())
}

fn scan_type_label(scan_type: &ScanType) -> &'static str {
    match scan_type {
        ScanType::Standard => "Standard",
        ScanType::Misrouted { .. } => "Misrouted",
        ScanType::Rejected { .. } => "Rejected",
        ScanType::CarryForward { .. } => "Carry-forward",
    }
}

/// Turn operator input into a validated, not-yet-persisted entry.
pub fn build_entry(
    candidate: &NewParcelEntry,
    registry: &RegistrySnapshot,
) -> Result<ParcelScanEntry, String> {
    let entry = ParcelScanEntry {
        id: 0,
        barcode: normalize_barcode(&candidate.barcode),
        round_id: candidate.round_id,
        drop_number: candidate.drop_number,
        sub_depot_id: candidate.sub_depot_id,
        courier_id: candidate.courier_id.trim().to_string(),
        sorter_team_member_id: candidate.sorter_team_member_id,
        client_id: candidate.client_id,
        time_scanned: candidate.time_scanned.unwrap_or_else(Utc::now),
        scan_type: candidate.scan_type.clone(),
        recovery_date: candidate.recovered.then(today),
        date_added: candidate.date_added_or_today(),
    };
    validate_entry(&entry, registry)?;
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, Courier, RegistryImport};

    fn registry() -> RegistrySnapshot {
        RegistrySnapshot::from_lists(RegistryImport {
            clients: vec![Client {
                id: 1,
                name: "Amazon".into(),
                is_high_priority: false,
                tracking_carrier: None,
            }],
            couriers: vec![Courier {
                id: "C001".into(),
                name: "Sam".into(),
                is_active: true,
            }],
            ..Default::default()
        })
    }

    #[test]
    fn test_barcode_is_normalized_before_checking() {
        let candidate = NewParcelEntry::standard(" abcdefgh1234567z ", 1, 71, "C001", 3, 1);
        let entry = build_entry(&candidate, &registry()).unwrap();
        assert_eq!(entry.barcode, "ABCDEFGH1234567Z");
        assert!(!entry.is_recovered());
    }

    #[test]
    fn test_barcode_length_and_charset() {
        assert!(check_barcode("ABCDEFGH12345678").is_ok());
        assert!(check_barcode("ABCDEFGH1234567").is_err());
        assert!(check_barcode("ABCDEFGH123456789").is_err());
        assert!(check_barcode("ABCDEFGH-2345678").is_err());
    }

    #[test]
    fn test_required_references() {
        let reg = RegistrySnapshot::default();
        let ok = NewParcelEntry::standard("ABCDEFGH12345678", 1, 71, "C001", 3, 1);
        assert!(build_entry(&ok, &reg).is_ok());

        let mut no_round = ok.clone();
        no_round.round_id = 0;
        assert_eq!(build_entry(&no_round, &reg).unwrap_err(), "Round is required");

        let mut no_courier = ok.clone();
        no_courier.courier_id = "  ".into();
        assert_eq!(build_entry(&no_courier, &reg).unwrap_err(), "Courier is required");

        let mut no_sorter = ok.clone();
        no_sorter.sorter_team_member_id = 0;
        assert!(build_entry(&no_sorter, &reg).is_err());

        let mut no_client = ok;
        no_client.client_id = 0;
        assert!(build_entry(&no_client, &reg).is_err());
    }

    #[test]
    fn test_registry_membership_checked_when_loaded() {
        let candidate = NewParcelEntry::standard("ABCDEFGH12345678", 1, 71, "C999", 3, 1);
        assert_eq!(
            build_entry(&candidate, &registry()).unwrap_err(),
            "Unknown courier C999"
        );
        // Rounds are not loaded in this registry, so any round passes
        let candidate = NewParcelEntry::standard("ABCDEFGH12345678", 42, 71, "C001", 3, 1);
        assert!(build_entry(&candidate, &registry()).is_ok());
    }

    #[test]
    fn test_scan_type_references_required() {
        let mut candidate = NewParcelEntry::standard("ABCDEFGH12345678", 1, 71, "C001", 3, 1);
        candidate.scan_type = ScanType::CarryForward {
            courier_id: String::new(),
        };
        assert_eq!(
            build_entry(&candidate, &RegistrySnapshot::default()).unwrap_err(),
            "Carry-forward parcels need a courier"
        );
        candidate.scan_type = ScanType::Misrouted {
            delivery_unit_id: 0,
        };
        assert!(build_entry(&candidate, &RegistrySnapshot::default()).is_err());
    }
}
