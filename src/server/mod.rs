//! HTTP API for the depot ledger.
//!
//! Exposes the registries, the missing-parcel ledger (including the
//! escalation checklist that guards it), carrier tracking and the
//! reconciliation reports as JSON endpoints.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::escalation::ChecklistQuestion;
use crate::ledger::{LedgerBackend, LedgerError, ParcelLedger};
use crate::reports::ReportService;
use crate::repository::DbContext;
use crate::tracking::{HttpCarrierTracker, TrackingRefresher};
use crate::workflow::ParcelWorkflow;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub ctx: DbContext,
    /// The operator workflow. Only one checklist may be open at a time.
    pub workflow: Arc<Mutex<ParcelWorkflow>>,
    pub reports: ReportService,
    pub tracking: Arc<TrackingRefresher>,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let ctx = settings.create_db_context();
        ctx.init_schema().await?;

        let tracker = HttpCarrierTracker::new(
            settings.tracking_base_url.clone(),
            settings.tracking_timeout(),
        )?;
        if !tracker.is_enabled() {
            tracing::info!("Carrier tracking disabled: no tracking.base_url configured");
        }
        let refresher = TrackingRefresher::new(
            Arc::new(tracker),
            settings.refresh_cooldown(),
            &settings.default_carrier,
        );

        Ok(Self::from_parts(ctx, settings.checklist_questions.clone(), refresher).await?)
    }

    /// Build state over an initialised database, hydrating the ledger.
    pub async fn from_parts(
        ctx: DbContext,
        questions: Vec<ChecklistQuestion>,
        refresher: TrackingRefresher,
    ) -> Result<Self, LedgerError> {
        let registry = Arc::new(ctx.registries().snapshot().await?);
        let backend: Arc<dyn LedgerBackend> = Arc::new(ctx.parcels());
        let ledger = ParcelLedger::open(backend, registry).await?;

        Ok(Self {
            reports: ReportService::new(ctx.clone()),
            workflow: Arc::new(Mutex::new(ParcelWorkflow::with_questions(ledger, questions))),
            tracking: Arc::new(refresher),
            ctx,
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let state = AppState::new(settings).await?;
    let app = create_router(state);

    let addr: SocketAddr = bind.parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Used by tests that do not talk to a tracking service.
#[cfg(test)]
pub(crate) fn disabled_refresher() -> TrackingRefresher {
    let tracker = HttpCarrierTracker::new(None, std::time::Duration::from_secs(1)).unwrap();
    TrackingRefresher::new(Arc::new(tracker), std::time::Duration::from_secs(30), "royal_mail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::escalation::standard_questions;
    use crate::models::{Client, Courier, RegistryImport, Round, SubDepot, TeamMember};

    async fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_sqlite_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();

        ctx.registries()
            .import(&RegistryImport {
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
                        tracking_carrier: Some("dpd".into()),
                    },
                ],
                couriers: vec![Courier {
                    id: "C001".into(),
                    name: "Sam".into(),
                    is_active: true,
                }],
                rounds: vec![
                    Round {
                        id: 1,
                        name: "R1".into(),
                        sub_depot_id: 71,
                    },
                    Round {
                        id: 2,
                        name: "R2".into(),
                        sub_depot_id: 71,
                    },
                ],
                sub_depots: vec![SubDepot {
                    id: 71,
                    name: "North".into(),
                    delivery_unit_id: Some(1),
                }],
                team_members: vec![TeamMember {
                    id: 3,
                    name: "Jo".into(),
                    role: "sorter".into(),
                }],
                delivery_units: Vec::new(),
            })
            .await
            .unwrap();

        let state = AppState::from_parts(ctx, standard_questions(), disabled_refresher())
            .await
            .unwrap();
        (create_router(state), dir)
    }

    async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn parcel(barcode: &str, client_id: i32, round_id: i32) -> Value {
        json!({
            "barcode": barcode,
            "round_id": round_id,
            "sub_depot_id": 71,
            "courier_id": "C001",
            "sorter_team_member_id": 3,
            "client_id": client_id,
            "date_added": "2024-06-03"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = setup_test_app().await;
        let (status, _) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_registry_lists() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = send(&app, "GET", "/api/clients", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["error"], false);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);

        let (_, json) = send(&app, "GET", "/api/couriers", None).await;
        assert_eq!(json["data"][0]["id"], "C001");
        let (_, json) = send(&app, "GET", "/api/delivery-units", None).await;
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_append_skips_invalid_rows() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = send(
            &app,
            "POST",
            "/api/missing-parcels",
            Some(json!([parcel("abcd1234efgh5678", 1, 1), parcel("SHORT", 1, 1)])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"][0]["barcode"], "ABCD1234EFGH5678");
        assert_eq!(json["data"][0]["is_recovered"], false);
        assert_eq!(json["context"]["skipped"], 1);

        let (_, json) = send(&app, "GET", "/api/missing-parcels?date=2024-06-03&sub_depot=71", None).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);

        let (status, json) = send(&app, "POST", "/api/missing-parcels", Some(json!([parcel("SHORT", 1, 1)]))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], true);
    }

    #[tokio::test]
    async fn test_high_priority_append_goes_through_checklist() {
        let (app, _dir) = setup_test_app().await;

        let (status, json) = send(
            &app,
            "POST",
            "/api/missing-parcels",
            Some(json!([parcel("ASOS000000000001", 2, 1)])),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["data"]["step"], 0);

        // Another gated action while the checklist is open is a conflict
        let (status, _) = send(
            &app,
            "POST",
            "/api/missing-parcels",
            Some(json!([parcel("ASOS000000000002", 2, 1)])),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, json) = send(&app, "POST", "/api/checklist/answer", Some(json!({"answer": "no"}))).await;
        assert_eq!(json["data"]["step"], 0);
        assert_eq!(
            json["data"]["alert"],
            "Please check the cages for this parcel before continuing."
        );

        let mut last = (StatusCode::OK, Value::Null);
        for _ in 0..5 {
            last = send(&app, "POST", "/api/checklist/answer", Some(json!({"answer": "yes"}))).await;
        }
        assert_eq!(last.0, StatusCode::CREATED);
        assert_eq!(last.1["data"][0]["barcode"], "ASOS000000000001");

        let (status, _) = send(&app, "GET", "/api/checklist", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "POST", "/api/checklist/cancel", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_edit_recovery_and_delete() {
        let (app, _dir) = setup_test_app().await;
        let (_, json) = send(
            &app,
            "POST",
            "/api/missing-parcels",
            Some(json!([parcel("AMZN000000000001", 1, 1)])),
        )
        .await;
        let id = json["data"][0]["id"].as_i64().unwrap();

        let (status, json) = send(
            &app,
            "PUT",
            &format!("/api/missing-parcels/{}", id),
            Some(json!({"round_id": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["round_id"], 2);

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/missing-parcels/{}", id),
            Some(json!({"courier_id": "C999"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, json) = send(
            &app,
            "PUT",
            &format!("/api/missing-parcels/{}/recovery", id),
            Some(json!({"recovered": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["is_recovered"], true);
        assert!(json["data"]["recovery_date"].is_string());

        let (status, _) = send(&app, "DELETE", &format!("/api/missing-parcels/{}", id), None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(&app, "GET", "/api/missing-parcels/9999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tracking_refresh_is_best_effort_and_throttled() {
        let (app, _dir) = setup_test_app().await;
        send(
            &app,
            "POST",
            "/api/missing-parcels",
            Some(json!([parcel("AMZN000000000001", 1, 1)])),
        )
        .await;

        let (status, json) = send(&app, "POST", "/api/missing-parcels/tracking/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["failed"], 1);
        assert_eq!(json["data"]["updated"], 0);

        let (status, json) = send(&app, "POST", "/api/missing-parcels/tracking/refresh", None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"], true);

        let (status, _) = send(&app, "GET", "/api/missing-parcels/tracking", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cage_return_and_duc_flow() {
        let (app, _dir) = setup_test_app().await;
        send(
            &app,
            "POST",
            "/api/missing-parcels",
            Some(json!([parcel("AMZN000000000001", 1, 1), parcel("AMZN000000000002", 1, 2)])),
        )
        .await;

        let (status, json) = send(&app, "GET", "/api/reports/cage-return?date=2024-06-03&sub_depot=71", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["lines"].as_array().unwrap().len(), 2);

        let submitter = json!({"id": 7, "name": "Alex"});
        let (status, json) = send(
            &app,
            "PUT",
            "/api/reports/cage-return",
            Some(json!({
                "date": "2024-06-03",
                "sub_depot_id": 71,
                "non_returns": [{"round_id": 1, "courier_id": "C001"}],
                "submitted_by": submitter,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["non_returns"].as_array().unwrap().len(), 1);

        let draft = json!({"date": "2024-06-03", "total_returns": 4, "submitted_by": submitter});
        let (status, _) = send(&app, "POST", "/api/reports/duc", Some(draft)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, summary) = send(&app, "GET", "/api/reports/duc/2024-06-03/missing-summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["data"]["total_missing"], 2);
        assert_eq!(summary["data"]["recovery_rate"], 0);

        let draft = json!({
            "date": "2024-06-03",
            "total_returns": 4,
            "missing_summary": summary["data"],
            "submitted_by": submitter,
        });
        let (status, _) = send(&app, "POST", "/api/reports/duc", Some(draft)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, json) = send(&app, "GET", "/api/reports/duc/2024-06-03", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total_returns"], 4);
    }

    #[tokio::test]
    async fn test_missort_dataset_and_summary() {
        let (app, _dir) = setup_test_app().await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/cage-audit-missorts",
            Some(json!({"audit_date": "2024-06-03", "sub_depot_id": 71, "round_id": 1, "client_id": 2, "quantity": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, json) = send(&app, "GET", "/api/cage-audit-missorts?date=2024-06-03", None).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);

        let (_, json) = send(&app, "GET", "/api/reports/missort-summary?date=2024-06-03", None).await;
        assert_eq!(json["data"]["total_missorts"], 3);
        assert_eq!(json["data"]["missorts_by_client"][0]["client_name"], "ASOS");

        let (status, json) = send(
            &app,
            "POST",
            "/api/reports/missort-summary",
            Some(json!({"date": "2024-06-03", "sub_depot_id": 71, "submitted_by": {"id": 7, "name": "Alex"}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        // The summary fields sit next to the submitter in a saved report
        assert_eq!(json["data"]["total_missorts"], 3);
        assert_eq!(json["data"]["submitted_by"]["name"], "Alex");
    }
}
