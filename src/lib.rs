//! depot-ledger - missing-parcel ledger and daily depot reconciliation.
//!
//! Operators log parcels that were scanned but not delivered, track them
//! until they turn up, and roll the day's ledger into missort, cage return
//! and DUC report snapshots. Parcels for high-priority clients are held
//! behind an escalation checklist before they can be logged or corrected.

pub mod cli;
pub mod config;
pub mod escalation;
pub mod ledger;
pub mod models;
pub mod reports;
pub mod repository;
pub mod schema;
pub mod server;
pub mod tracking;
pub mod workflow;
