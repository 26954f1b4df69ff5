//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking,
//! running on SQLite through diesel-async's `SyncConnectionWrapper`.

pub mod diesel_context;
pub mod diesel_missort;
pub mod diesel_models;
pub mod diesel_parcel;
pub mod diesel_registry;
pub mod diesel_report;
pub mod pool;

// Utilities
pub mod util;

pub use diesel_context::DbContext;
pub use diesel_missort::DieselMissortRepository;
pub use diesel_parcel::DieselParcelRepository;
pub use diesel_registry::{DieselRegistryRepository, ImportCounts};
pub use diesel_report::DieselReportRepository;
pub use pool::{DbPool, DieselError};
pub use util::to_diesel_error;
