// Kept in sync by hand with `DbContext::init_schema`.

diesel::table! {
    missing_parcels (id) {
        id -> Integer,
        barcode -> Text,
        round_id -> Integer,
        drop_number -> Integer,
        sub_depot_id -> Integer,
        courier_id -> Text,
        sorter_team_member_id -> Integer,
        client_id -> Integer,
        time_scanned -> Text,
        scan_type -> Text,
        cfwd_courier_id -> Nullable<Text>,
        misrouted_du_id -> Nullable<Integer>,
        rejected_courier_id -> Nullable<Text>,
        is_recovered -> Bool,
        recovery_date -> Nullable<Text>,
        date_added -> Text,
    }
}

diesel::table! {
    clients (id) {
        id -> Integer,
        name -> Text,
        is_high_priority -> Bool,
        tracking_carrier -> Nullable<Text>,
    }
}

diesel::table! {
    couriers (id) {
        id -> Text,
        name -> Text,
        is_active -> Bool,
    }
}

diesel::table! {
    rounds (id) {
        id -> Integer,
        name -> Text,
        sub_depot_id -> Integer,
    }
}

diesel::table! {
    sub_depots (id) {
        id -> Integer,
        name -> Text,
        delivery_unit_id -> Nullable<Integer>,
    }
}

diesel::table! {
    team_members (id) {
        id -> Integer,
        name -> Text,
        role -> Text,
    }
}

diesel::table! {
    delivery_units (id) {
        id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    cage_audit_missorts (id) {
        id -> Integer,
        audit_date -> Text,
        sub_depot_id -> Integer,
        round_id -> Integer,
        client_id -> Integer,
        quantity -> Integer,
        barcode -> Nullable<Text>,
        notes -> Nullable<Text>,
        recorded_at -> Text,
    }
}

diesel::table! {
    daily_missort_reports (report_key) {
        report_key -> Text,
        report_date -> Text,
        sub_depot_id -> Nullable<Integer>,
        total_missorts -> Integer,
        missorts_by_client -> Text,
        missorts_by_round -> Text,
        submitted_by_id -> Integer,
        submitted_by_name -> Text,
        submitted_at -> Text,
    }
}

diesel::table! {
    cage_return_reports (report_key) {
        report_key -> Text,
        report_date -> Text,
        sub_depot_id -> Integer,
        non_returns -> Text,
        notes -> Text,
        submitted_by_id -> Integer,
        submitted_by_name -> Text,
        submitted_at -> Text,
    }
}

diesel::table! {
    duc_reports (report_date) {
        report_date -> Text,
        failed_rounds -> Text,
        total_returns -> Integer,
        segregated_parcels -> Text,
        total_missing -> Integer,
        unrecovered -> Integer,
        recovery_rate -> Integer,
        summary_imported_at -> Text,
        submitted_by_id -> Integer,
        submitted_by_name -> Text,
        submitted_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    missing_parcels,
    clients,
    couriers,
    rounds,
    sub_depots,
    team_members,
    delivery_units,
    cage_audit_missorts,
    daily_missort_reports,
    cage_return_reports,
    duc_reports,
);
