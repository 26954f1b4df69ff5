//! Diesel ORM models for database tables.
//!
//! These models provide compile-time type checking for database operations.
//! Conversion to and from the domain models lives next to each repository.

use diesel::prelude::*;

use crate::schema;

/// Missing-parcel row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::missing_parcels)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MissingParcelRecord {
    pub id: i32,
    pub barcode: String,
    pub round_id: i32,
    pub drop_number: i32,
    pub sub_depot_id: i32,
    pub courier_id: String,
    pub sorter_team_member_id: i32,
    pub client_id: i32,
    pub time_scanned: String,
    pub scan_type: String,
    pub cfwd_courier_id: Option<String>,
    pub misrouted_du_id: Option<i32>,
    pub rejected_courier_id: Option<String>,
    pub is_recovered: bool,
    pub recovery_date: Option<String>,
    pub date_added: String,
}

/// New missing-parcel row for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::missing_parcels)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewMissingParcel<'a> {
    pub barcode: &'a str,
    pub round_id: i32,
    pub drop_number: i32,
    pub sub_depot_id: i32,
    pub courier_id: &'a str,
    pub sorter_team_member_id: i32,
    pub client_id: i32,
    pub time_scanned: String,
    pub scan_type: &'a str,
    pub cfwd_courier_id: Option<&'a str>,
    pub misrouted_du_id: Option<i32>,
    pub rejected_courier_id: Option<&'a str>,
    pub is_recovered: bool,
    pub recovery_date: Option<String>,
    pub date_added: String,
}

/// Full-row changeset for edits. `None` columns are written as NULL so a
/// scan type change clears the references of the previous type.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = schema::missing_parcels)]
#[diesel(treat_none_as_null = true)]
pub struct MissingParcelChanges<'a> {
    pub barcode: &'a str,
    pub round_id: i32,
    pub drop_number: i32,
    pub sub_depot_id: i32,
    pub courier_id: &'a str,
    pub sorter_team_member_id: i32,
    pub client_id: i32,
    pub time_scanned: String,
    pub scan_type: &'a str,
    pub cfwd_courier_id: Option<&'a str>,
    pub misrouted_du_id: Option<i32>,
    pub rejected_courier_id: Option<&'a str>,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::clients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_default_value = false)]
pub struct ClientRecord {
    pub id: i32,
    pub name: String,
    pub is_high_priority: bool,
    pub tracking_carrier: Option<String>,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::couriers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CourierRecord {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::rounds)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RoundRecord {
    pub id: i32,
    pub name: String,
    pub sub_depot_id: i32,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::sub_depots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_default_value = false)]
pub struct SubDepotRecord {
    pub id: i32,
    pub name: String,
    pub delivery_unit_id: Option<i32>,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::team_members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TeamMemberRecord {
    pub id: i32,
    pub name: String,
    pub role: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::delivery_units)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DeliveryUnitRecord {
    pub id: i32,
    pub name: String,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::cage_audit_missorts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CageAuditMissortRecord {
    pub id: i32,
    pub audit_date: String,
    pub sub_depot_id: i32,
    pub round_id: i32,
    pub client_id: i32,
    pub quantity: i32,
    pub barcode: Option<String>,
    pub notes: Option<String>,
    pub recorded_at: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::cage_audit_missorts)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewCageAuditMissortRecord<'a> {
    pub audit_date: String,
    pub sub_depot_id: i32,
    pub round_id: i32,
    pub client_id: i32,
    pub quantity: i32,
    pub barcode: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub recorded_at: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::daily_missort_reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_default_value = false)]
pub struct DailyMissortReportRecord {
    pub report_key: String,
    pub report_date: String,
    pub sub_depot_id: Option<i32>,
    pub total_missorts: i32,
    pub missorts_by_client: String,
    pub missorts_by_round: String,
    pub submitted_by_id: i32,
    pub submitted_by_name: String,
    pub submitted_at: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::cage_return_reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CageReturnReportRecord {
    pub report_key: String,
    pub report_date: String,
    pub sub_depot_id: i32,
    pub non_returns: String,
    pub notes: String,
    pub submitted_by_id: i32,
    pub submitted_by_name: String,
    pub submitted_at: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::duc_reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DucReportRecord {
    pub report_date: String,
    pub failed_rounds: String,
    pub total_returns: i32,
    pub segregated_parcels: String,
    pub total_missing: i32,
    pub unrecovered: i32,
    pub recovery_rate: i32,
    pub summary_imported_at: String,
    pub submitted_by_id: i32,
    pub submitted_by_name: String,
    pub submitted_at: String,
}
