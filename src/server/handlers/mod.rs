//! HTTP request handlers for the web server.

mod api_types;
mod checklist;
mod helpers;
mod parcels;
mod registries;
mod reports;
mod tracking;

// Re-export handlers for use by the router
pub use checklist::{checklist_answer, checklist_cancel, checklist_view};
pub use parcels::{
    append_parcels, delete_parcel, edit_parcel, get_parcel, list_parcels, set_recovery,
};
pub use registries::{
    health, list_clients, list_couriers, list_delivery_units, list_rounds, list_sub_depots,
    list_team_members,
};
pub use reports::{
    add_missort, get_duc, import_missing_summary, list_missorts, missort_summary,
    open_cage_return, save_cage_return, save_missort_summary, submit_duc,
};
pub use tracking::{refresh_parcel_tracking, refresh_tracking, tracking_statuses};
