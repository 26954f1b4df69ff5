//! Cage return sheet.
//!
//! Lists every (round, courier) pair that has missing parcels in scope.
//! Pairs default to "returned"; the operator marks the cages that did not
//! come back and only those are stored.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    CageReturnLine, CageReturnReport, CageReturnSheet, ParcelScanEntry, RegistrySnapshot,
    RoundCourierPair, Submitter,
};

/// Build the sheet for a date and sub-depot.
///
/// When a saved report exists its non-returns are pre-checked. A saved pair
/// that no longer appears in the ledger is still listed so re-opening never
/// drops a recorded non-return.
pub fn open_sheet<'a>(
    date: NaiveDate,
    sub_depot_id: i32,
    entries: impl IntoIterator<Item = &'a ParcelScanEntry>,
    saved: Option<&CageReturnReport>,
    registry: &RegistrySnapshot,
) -> CageReturnSheet {
    let mut pairs: BTreeSet<RoundCourierPair> = entries
        .into_iter()
        .filter(|e| e.date_added == date && e.sub_depot_id == sub_depot_id)
        .map(|e| RoundCourierPair::new(e.round_id, &e.courier_id))
        .collect();

    let checked: BTreeSet<RoundCourierPair> = saved
        .map(|r| r.non_returns.iter().cloned().collect())
        .unwrap_or_default();
    pairs.extend(checked.iter().cloned());

    let lines = pairs
        .into_iter()
        .map(|pair| CageReturnLine {
            round_name: registry.round_name(pair.round_id),
            courier_name: registry.courier_name(&pair.courier_id),
            not_returned: checked.contains(&pair),
            round_id: pair.round_id,
            courier_id: pair.courier_id,
        })
        .collect();

    CageReturnSheet {
        date,
        sub_depot_id,
        lines,
        notes: saved.map(|r| r.notes.clone()).unwrap_or_default(),
        from_snapshot: saved.is_some(),
    }
}

/// Freeze a sheet into a submitter-attributed report.
pub fn finalize(
    sheet: &CageReturnSheet,
    submitted_by: Submitter,
    submitted_at: DateTime<Utc>,
) -> CageReturnReport {
    CageReturnReport {
        date: sheet.date,
        sub_depot_id: sheet.sub_depot_id,
        non_returns: sheet.non_returns(),
        notes: sheet.notes.trim().to_string(),
        submitted_by,
        submitted_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScanType;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn entry(id: i32, round_id: i32, courier_id: &str, sub_depot_id: i32) -> ParcelScanEntry {
        ParcelScanEntry {
            id,
            barcode: format!("AAAAAAAAAAAAAA{:02}", id),
            round_id,
            drop_number: 0,
            sub_depot_id,
            courier_id: courier_id.into(),
            sorter_team_member_id: 3,
            client_id: 1,
            time_scanned: Utc::now(),
            scan_type: ScanType::Standard,
            recovery_date: None,
            date_added: day(),
        }
    }

    fn submitter() -> Submitter {
        Submitter {
            id: 7,
            name: "Alex".into(),
        }
    }

    #[test]
    fn test_marking_one_round_stores_exactly_that_pair() {
        let entries = vec![
            entry(1, 2, "C001", 71),
            entry(2, 1, "C001", 71),
            entry(3, 1, "C001", 71),
            entry(4, 5, "C009", 12),
        ];
        let mut sheet = open_sheet(day(), 71, &entries, None, &RegistrySnapshot::default());

        let pairs: Vec<RoundCourierPair> = sheet.lines.iter().map(CageReturnLine::pair).collect();
        assert_eq!(
            pairs,
            vec![RoundCourierPair::new(1, "C001"), RoundCourierPair::new(2, "C001")]
        );
        assert!(sheet.lines.iter().all(|l| !l.not_returned));
        assert!(!sheet.from_snapshot);

        assert!(sheet.set_not_returned(1, "C001", true));
        let report = finalize(&sheet, submitter(), Utc::now());
        assert_eq!(report.non_returns, vec![RoundCourierPair::new(1, "C001")]);
        assert_eq!(report.key(), "2024-06-03/71");
    }

    #[test]
    fn test_reopening_restores_saved_checks() {
        let entries = vec![entry(1, 1, "C001", 71), entry(2, 2, "C001", 71)];
        let saved = CageReturnReport {
            date: day(),
            sub_depot_id: 71,
            non_returns: vec![RoundCourierPair::new(2, "C001"), RoundCourierPair::new(9, "C004")],
            notes: "van 3 late".into(),
            submitted_by: submitter(),
            submitted_at: Utc::now(),
        };

        let sheet = open_sheet(day(), 71, &entries, Some(&saved), &RegistrySnapshot::default());
        assert!(sheet.from_snapshot);
        assert_eq!(sheet.notes, "van 3 late");
        let checked: Vec<(i32, bool)> = sheet
            .lines
            .iter()
            .map(|l| (l.round_id, l.not_returned))
            .collect();
        // Round 9 is no longer in the ledger but stays listed and checked
        assert_eq!(checked, vec![(1, false), (2, true), (9, true)]);
        assert_eq!(sheet.lines[2].round_name, "Round #9");
    }
}
