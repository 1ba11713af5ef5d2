//! Diesel ORM records for database tables.
//!
//! Records mirror the TEXT-heavy SQLite layout; conversion to domain models
//! happens in the individual repositories.

use diesel::prelude::*;

use crate::schema;

/// Geocode cache record.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::address_cache)]
#[diesel(primary_key(normalized_address))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CacheRecord {
    pub normalized_address: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: String,
    pub expires_at: String,
}

/// New geocode cache entry for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::address_cache)]
pub struct NewCacheEntry<'a> {
    pub normalized_address: &'a str,
    pub address: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: &'a str,
    pub expires_at: &'a str,
}

/// District record.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::districts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DistrictRecord {
    pub id: String,
    pub district_type: String,
    pub state_fips: String,
    pub district_code: String,
    pub name: String,
    pub boundary: String,
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// New district for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::districts)]
pub struct NewDistrict<'a> {
    pub id: &'a str,
    pub district_type: &'a str,
    pub state_fips: &'a str,
    pub district_code: &'a str,
    pub name: &'a str,
    pub boundary: &'a str,
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Official record.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::officials)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OfficialRecord {
    pub id: String,
    pub source_type: String,
    pub source_id: String,
    pub district_id: String,
    pub full_name: String,
    pub office_title: String,
    pub party: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub term_start: Option<String>,
    pub term_end: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New official for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::officials)]
pub struct NewOfficial<'a> {
    pub id: &'a str,
    pub source_type: &'a str,
    pub source_id: &'a str,
    pub district_id: &'a str,
    pub full_name: &'a str,
    pub office_title: &'a str,
    pub party: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub website: Option<&'a str>,
    pub term_start: Option<String>,
    pub term_end: Option<String>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Office location record.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::offices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OfficeRecord {
    pub id: i32,
    pub official_id: String,
    pub office_type: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// New office for insertion (id assigned by SQLite).
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::offices)]
pub struct NewOffice<'a> {
    pub official_id: &'a str,
    pub office_type: &'a str,
    pub address_line1: Option<&'a str>,
    pub address_line2: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub zip: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Data source sync status record.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::data_sources)]
#[diesel(primary_key(source_name))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DataSourceRecord {
    pub source_name: String,
    pub status: String,
    pub last_sync: String,
    pub error_message: Option<String>,
}

/// New data source status for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::data_sources)]
pub struct NewDataSource<'a> {
    pub source_name: &'a str,
    pub status: &'a str,
    pub last_sync: &'a str,
    pub error_message: Option<&'a str>,
}
