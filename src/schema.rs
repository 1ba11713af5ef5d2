// Diesel table definitions, kept in sync with repository/context.rs init_schema.

diesel::table! {
    address_cache (normalized_address) {
        normalized_address -> Text,
        address -> Text,
        latitude -> Double,
        longitude -> Double,
        created_at -> Text,
        expires_at -> Text,
    }
}

diesel::table! {
    districts (id) {
        id -> Text,
        district_type -> Text,
        state_fips -> Text,
        district_code -> Text,
        name -> Text,
        boundary -> Text,
        min_lon -> Double,
        min_lat -> Double,
        max_lon -> Double,
        max_lat -> Double,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    officials (id) {
        id -> Text,
        source_type -> Text,
        source_id -> Text,
        district_id -> Text,
        full_name -> Text,
        office_title -> Text,
        party -> Nullable<Text>,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        website -> Nullable<Text>,
        term_start -> Nullable<Text>,
        term_end -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    offices (id) {
        id -> Integer,
        official_id -> Text,
        office_type -> Text,
        address_line1 -> Nullable<Text>,
        address_line2 -> Nullable<Text>,
        city -> Nullable<Text>,
        state -> Nullable<Text>,
        zip -> Nullable<Text>,
        phone -> Nullable<Text>,
        latitude -> Nullable<Double>,
        longitude -> Nullable<Double>,
    }
}

diesel::table! {
    data_sources (source_name) {
        source_name -> Text,
        status -> Text,
        last_sync -> Text,
        error_message -> Nullable<Text>,
    }
}

diesel::joinable!(officials -> districts (district_id));
diesel::joinable!(offices -> officials (official_id));

diesel::allow_tables_to_appear_in_same_query!(districts, officials, offices);
