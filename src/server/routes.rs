//! Router configuration for the web server.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Registries (read-only)
        .route("/api/clients", get(handlers::list_clients))
        .route("/api/couriers", get(handlers::list_couriers))
        .route("/api/rounds", get(handlers::list_rounds))
        .route("/api/sub-depots", get(handlers::list_sub_depots))
        .route("/api/team-members", get(handlers::list_team_members))
        .route("/api/delivery-units", get(handlers::list_delivery_units))
        // Missing-parcel ledger
        .route(
            "/api/missing-parcels",
            get(handlers::list_parcels).post(handlers::append_parcels),
        )
        .route(
            "/api/missing-parcels/tracking",
            get(handlers::tracking_statuses),
        )
        .route(
            "/api/missing-parcels/tracking/refresh",
            post(handlers::refresh_tracking),
        )
        .route(
            "/api/missing-parcels/:id",
            get(handlers::get_parcel)
                .put(handlers::edit_parcel)
                .delete(handlers::delete_parcel),
        )
        .route(
            "/api/missing-parcels/:id/recovery",
            put(handlers::set_recovery),
        )
        .route(
            "/api/missing-parcels/:id/tracking",
            post(handlers::refresh_parcel_tracking),
        )
        // Escalation checklist
        .route("/api/checklist", get(handlers::checklist_view))
        .route("/api/checklist/answer", post(handlers::checklist_answer))
        .route("/api/checklist/cancel", post(handlers::checklist_cancel))
        // Cage audit missorts
        .route(
            "/api/cage-audit-missorts",
            get(handlers::list_missorts).post(handlers::add_missort),
        )
        // Reports
        .route(
            "/api/reports/missort-summary",
            get(handlers::missort_summary).post(handlers::save_missort_summary),
        )
        .route(
            "/api/reports/cage-return",
            get(handlers::open_cage_return).put(handlers::save_cage_return),
        )
        .route("/api/reports/duc", post(handlers::submit_duc))
        .route("/api/reports/duc/:date", get(handlers::get_duc))
        .route(
            "/api/reports/duc/:date/missing-summary",
            get(handlers::import_missing_summary),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
