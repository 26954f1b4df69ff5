//! Diesel database context for managing the connection factory and repository access.
//!
//! Provides a unified entry point for database operations. Each aggregate
//! (parcels, registries, cage-audit missorts, report snapshots) gets its own
//! narrow repository; they all share one [`DbPool`].

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::diesel_missort::DieselMissortRepository;
use super::diesel_parcel::DieselParcelRepository;
use super::diesel_registry::DieselRegistryRepository;
use super::diesel_report::DieselReportRepository;
use super::pool::{DbPool, DieselError};
use crate::with_conn;

/// Diesel database context that owns the pool and hands out repositories.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_sqlite_path(&db_path);
/// ctx.init_schema().await?;
/// let registries = ctx.registries().snapshot().await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Create a context for an SQLite file.
    pub fn from_sqlite_path(db_path: &Path) -> Self {
        Self {
            pool: DbPool::from_path(db_path),
        }
    }

    /// Create a context from a database URL (`sqlite:path` or a plain path).
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: DbPool::new(database_url),
        }
    }

    /// Create a context with an existing pool.
    #[allow(dead_code)]
    pub fn with_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn parcels(&self) -> DieselParcelRepository {
        DieselParcelRepository::new(self.pool.clone())
    }

    pub fn registries(&self) -> DieselRegistryRepository {
        DieselRegistryRepository::new(self.pool.clone())
    }

    pub fn missorts(&self) -> DieselMissortRepository {
        DieselMissortRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> DieselReportRepository {
        DieselReportRepository::new(self.pool.clone())
    }

    /// Initialize all database tables.
    ///
    /// This creates the necessary tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        with_conn!(self.pool, conn => {
            conn.batch_execute(
                r#"
                PRAGMA journal_mode = WAL;

                -- Missing-parcel ledger
                CREATE TABLE IF NOT EXISTS missing_parcels (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    barcode TEXT NOT NULL,
                    round_id INTEGER NOT NULL,
                    drop_number INTEGER NOT NULL DEFAULT 0,
                    sub_depot_id INTEGER NOT NULL,
                    courier_id TEXT NOT NULL,
                    sorter_team_member_id INTEGER NOT NULL,
                    client_id INTEGER NOT NULL,
                    time_scanned TEXT NOT NULL,
                    scan_type TEXT NOT NULL DEFAULT 'standard',
                    cfwd_courier_id TEXT,
                    misrouted_du_id INTEGER,
                    rejected_courier_id TEXT,
                    is_recovered INTEGER NOT NULL DEFAULT 0,
                    recovery_date TEXT,
                    date_added TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_missing_parcels_day
                    ON missing_parcels(date_added, sub_depot_id);
                CREATE INDEX IF NOT EXISTS idx_missing_parcels_barcode
                    ON missing_parcels(barcode);

                -- Reference registries
                CREATE TABLE IF NOT EXISTS clients (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    is_high_priority INTEGER NOT NULL DEFAULT 0,
                    tracking_carrier TEXT
                );
                CREATE TABLE IF NOT EXISTS couriers (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    is_active INTEGER NOT NULL DEFAULT 1
                );
                CREATE TABLE IF NOT EXISTS rounds (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    sub_depot_id INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS sub_depots (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    delivery_unit_id INTEGER
                );
                CREATE TABLE IF NOT EXISTS team_members (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT ''
                );
                CREATE TABLE IF NOT EXISTS delivery_units (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL
                );

                -- Cage audit dataset
                CREATE TABLE IF NOT EXISTS cage_audit_missorts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    audit_date TEXT NOT NULL,
                    sub_depot_id INTEGER NOT NULL,
                    round_id INTEGER NOT NULL,
                    client_id INTEGER NOT NULL,
                    quantity INTEGER NOT NULL DEFAULT 1,
                    barcode TEXT,
                    notes TEXT,
                    recorded_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_cage_audit_missorts_day
                    ON cage_audit_missorts(audit_date, sub_depot_id);

                -- Report snapshots
                CREATE TABLE IF NOT EXISTS daily_missort_reports (
                    report_key TEXT PRIMARY KEY,
                    report_date TEXT NOT NULL,
                    sub_depot_id INTEGER,
                    total_missorts INTEGER NOT NULL,
                    missorts_by_client TEXT NOT NULL DEFAULT '[]',
                    missorts_by_round TEXT NOT NULL DEFAULT '[]',
                    submitted_by_id INTEGER NOT NULL,
                    submitted_by_name TEXT NOT NULL,
                    submitted_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS cage_return_reports (
                    report_key TEXT PRIMARY KEY,
                    report_date TEXT NOT NULL,
                    sub_depot_id INTEGER NOT NULL,
                    non_returns TEXT NOT NULL DEFAULT '[]',
                    notes TEXT NOT NULL DEFAULT '',
                    submitted_by_id INTEGER NOT NULL,
                    submitted_by_name TEXT NOT NULL,
                    submitted_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS duc_reports (
                    report_date TEXT PRIMARY KEY,
                    failed_rounds TEXT NOT NULL DEFAULT '[]',
                    total_returns INTEGER NOT NULL DEFAULT 0,
                    segregated_parcels TEXT NOT NULL DEFAULT '[]',
                    total_missing INTEGER NOT NULL,
                    unrecovered INTEGER NOT NULL,
                    recovery_rate INTEGER NOT NULL,
                    summary_imported_at TEXT NOT NULL,
                    submitted_by_id INTEGER NOT NULL,
                    submitted_by_name TEXT NOT NULL,
                    submitted_at TEXT NOT NULL
                );
                "#,
            )
            .await
        })
    }
}
