//! End-to-end day at the depot.
//!
//! Loads registries into a fresh SQLite database, logs missing parcels
//! through the workflow (including a gated high-priority parcel), recovers
//! one of them and reconciles the day into report snapshots.

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::tempdir;

use depot_ledger::escalation::{standard_questions, ChecklistAnswer};
use depot_ledger::ledger::{LedgerBackend, ParcelLedger};
use depot_ledger::models::{
    Client, Courier, NewCageAuditMissort, NewParcelEntry, RegistryImport, Round, RoundCourierPair,
    SubDepot, Submitter, TeamMember,
};
use depot_ledger::reports::{CageReturnSubmission, ReportError, ReportService};
use depot_ledger::repository::DbContext;
use depot_ledger::workflow::{ParcelWorkflow, WorkflowError, WorkflowOutcome};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

fn supervisor() -> Submitter {
    Submitter {
        id: 7,
        name: "Alex".into(),
    }
}

fn registry_export() -> RegistryImport {
    RegistryImport {
        clients: vec![
            Client {
                id: 1,
                name: "Amazon".into(),
                is_high_priority: false,
                tracking_carrier: None,
            },
            Client {
                id: 2,
                name: "ASOS".into(),
                is_high_priority: true,
                tracking_carrier: None,
            },
        ],
        couriers: vec![
            Courier {
                id: "C001".into(),
                name: "Sam".into(),
                is_active: true,
            },
            Courier {
                id: "C002".into(),
                name: "Priya".into(),
                is_active: true,
            },
        ],
        rounds: vec![
            Round {
                id: 1,
                name: "North 1".into(),
                sub_depot_id: 71,
            },
            Round {
                id: 2,
                name: "North 2".into(),
                sub_depot_id: 71,
            },
        ],
        sub_depots: vec![SubDepot {
            id: 71,
            name: "North".into(),
            delivery_unit_id: None,
        }],
        team_members: vec![TeamMember {
            id: 3,
            name: "Jo".into(),
            role: "sorter".into(),
        }],
        delivery_units: Vec::new(),
    }
}

fn parcel(barcode: &str, round_id: i32, courier_id: &str, client_id: i32) -> NewParcelEntry {
    let mut entry = NewParcelEntry::standard(barcode, round_id, 71, courier_id, 3, client_id);
    entry.date_added = Some(day());
    entry
}

async fn open(ctx: &DbContext) -> ParcelWorkflow {
    let registry = Arc::new(ctx.registries().snapshot().await.unwrap());
    let backend: Arc<dyn LedgerBackend> = Arc::new(ctx.parcels());
    let ledger = ParcelLedger::open(backend, registry).await.unwrap();
    ParcelWorkflow::with_questions(ledger, standard_questions())
}

#[tokio::test]
async fn test_full_day_reconciliation() {
    let dir = tempdir().unwrap();
    let ctx = DbContext::from_sqlite_path(&dir.path().join("depot.db"));
    ctx.init_schema().await.unwrap();
    let counts = ctx.registries().import(&registry_export()).await.unwrap();
    assert_eq!(counts.clients, 2);

    let mut workflow = open(&ctx).await;

    // Ordinary client: logged straight away, the short barcode is skipped
    let outcome = workflow
        .submit_append(vec![
            parcel("amzn000000000001", 1, "C001", 1),
            parcel("AMZN01", 1, "C001", 1),
            parcel("AMZN000000000002", 2, "C002", 1),
        ])
        .await
        .unwrap();
    let amazon = match outcome {
        WorkflowOutcome::Appended(result) => {
            assert_eq!(result.skipped, 1);
            result.persisted
        }
        other => panic!("expected append, got {:?}", other),
    };
    assert_eq!(amazon.len(), 2);
    assert_eq!(amazon[0].barcode, "AMZN000000000001");

    // High-priority client: held until all five questions are affirmed
    let outcome = workflow
        .submit_append(vec![parcel("ASOS000000000001", 1, "C001", 2)])
        .await
        .unwrap();
    assert!(matches!(outcome, WorkflowOutcome::ChecklistPending(ref v) if v.step == 0));
    assert!(matches!(
        workflow.submit_append(vec![parcel("AMZN000000000003", 1, "C001", 1)]).await,
        Err(WorkflowError::ChecklistActive)
    ));

    let outcome = workflow.answer(ChecklistAnswer::No).await.unwrap();
    match outcome {
        WorkflowOutcome::ChecklistPending(view) => {
            assert_eq!(view.step, 0);
            assert_eq!(
                view.alert.as_deref(),
                Some("Please check the cages for this parcel before continuing.")
            );
        }
        other => panic!("expected pending checklist, got {:?}", other),
    }
    let mut last = None;
    for _ in 0..5 {
        last = Some(workflow.answer(ChecklistAnswer::Yes).await.unwrap());
    }
    let asos_id = match last {
        Some(WorkflowOutcome::Appended(result)) => result.persisted[0].id,
        other => panic!("expected the held append to run, got {:?}", other),
    };
    assert!(!workflow.has_active_checklist());

    // Recovery toggles are never gated, even for high-priority parcels
    let recovered = workflow.set_recovered(asos_id, true).await.unwrap();
    assert!(recovered.is_recovered());

    // A second process sees the same ledger
    let reopened = open(&ctx).await;
    assert_eq!(reopened.ledger().len(), 3);
    assert_eq!(reopened.ledger().unrecovered().count(), 2);

    // Reconciliation
    let reports = ReportService::new(ctx.clone());

    let sheet = reports.open_cage_return(day(), 71).await.unwrap();
    let pairs: Vec<RoundCourierPair> = sheet.lines.iter().map(|l| l.pair()).collect();
    assert_eq!(
        pairs,
        vec![RoundCourierPair::new(1, "C001"), RoundCourierPair::new(2, "C002")]
    );
    let saved = reports
        .save_cage_return(CageReturnSubmission {
            date: day(),
            sub_depot_id: 71,
            non_returns: vec![RoundCourierPair::new(2, "C002")],
            notes: "van 2 back late".into(),
            submitted_by: supervisor(),
        })
        .await
        .unwrap();
    assert_eq!(saved.non_returns, vec![RoundCourierPair::new(2, "C002")]);

    ctx.missorts()
        .add(&NewCageAuditMissort {
            audit_date: day(),
            sub_depot_id: 71,
            round_id: 2,
            client_id: 2,
            quantity: 2,
            barcode: None,
            notes: None,
        })
        .await
        .unwrap();
    let missorts = reports
        .save_missort_summary(day(), Some(71), supervisor())
        .await
        .unwrap();
    assert_eq!(missorts.summary.total_missorts, 2);
    assert_eq!(missorts.summary.missorts_by_client[0].client_name, "ASOS");

    let mut draft = depot_ledger::models::DucReportDraft::new(day());
    assert!(matches!(
        reports.submit_duc(&draft, supervisor()).await,
        Err(ReportError::SummaryNotImported(_))
    ));
    let summary = reports.import_missing_summary(day()).await.unwrap();
    assert_eq!(summary.total_missing, 3);
    assert_eq!(summary.unrecovered, 2);
    assert_eq!(summary.recovery_rate, 33);
    draft.missing_summary = Some(summary);
    let duc = reports.submit_duc(&draft, supervisor()).await.unwrap();
    assert_eq!(reports.duc_report(day()).await.unwrap(), Some(duc));

    // Reports never touch the ledger
    let after = open(&ctx).await;
    assert_eq!(after.ledger().len(), 3);
}
