//! Official and office repositories.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{NewOffice, NewOfficial, OfficeRecord, OfficialRecord};
use super::parse_datetime;
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::{GeoPoint, Office, Official};
use crate::schema::{offices, officials};

impl From<OfficialRecord> for Official {
    fn from(record: OfficialRecord) -> Self {
        Official {
            id: record.id,
            source_type: record.source_type,
            source_id: record.source_id,
            district_id: record.district_id,
            full_name: record.full_name,
            office_title: record.office_title,
            party: record.party,
            email: record.email,
            phone: record.phone,
            website: record.website,
            term_start: record.term_start.as_deref().and_then(parse_date),
            term_end: record.term_end.as_deref().and_then(parse_date),
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

impl From<OfficeRecord> for Office {
    fn from(record: OfficeRecord) -> Self {
        let location = match (record.latitude, record.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };
        Office {
            id: record.id,
            official_id: record.official_id,
            office_type: record.office_type,
            address_line1: record.address_line1,
            address_line2: record.address_line2,
            city: record.city,
            state: record.state,
            zip: record.zip,
            phone: record.phone,
            location,
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Repository for official and office rows.
#[derive(Clone)]
pub struct OfficialRepository {
    pool: AsyncSqlitePool,
}

impl OfficialRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Get an official by its natural-key slug.
    pub async fn get(&self, id: &str) -> Result<Option<Official>, DieselError> {
        let mut conn = self.pool.get().await?;

        officials::table
            .find(id)
            .first::<OfficialRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Official::from))
    }

    /// Get all officials.
    pub async fn get_all(&self) -> Result<Vec<Official>, DieselError> {
        let mut conn = self.pool.get().await?;

        officials::table
            .load::<OfficialRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Official::from).collect())
    }

    /// Batched lookup of officials by district id set. Empty result is valid.
    pub async fn by_districts(&self, district_ids: &[String]) -> Result<Vec<Official>, DieselError> {
        if district_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;

        officials::table
            .filter(officials::district_id.eq_any(district_ids))
            .load::<OfficialRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Official::from).collect())
    }

    /// Insert or update an official by its natural key.
    ///
    /// On conflict all mutable fields are overwritten and updated_at
    /// refreshed; created_at is preserved from the existing row.
    pub async fn upsert(&self, official: &Official) -> Result<(), DieselError> {
        let created_at = match self.get(&official.id).await? {
            Some(existing) => existing.created_at,
            None => official.created_at,
        };

        let mut conn = self.pool.get().await?;

        let created_at = created_at.to_rfc3339();
        let updated_at = official.updated_at.to_rfc3339();

        diesel::replace_into(officials::table)
            .values(NewOfficial {
                id: &official.id,
                source_type: &official.source_type,
                source_id: &official.source_id,
                district_id: &official.district_id,
                full_name: &official.full_name,
                office_title: &official.office_title,
                party: official.party.as_deref(),
                email: official.email.as_deref(),
                phone: official.phone.as_deref(),
                website: official.website.as_deref(),
                term_start: official.term_start.map(|d| d.to_string()),
                term_end: official.term_end.map(|d| d.to_string()),
                created_at: &created_at,
                updated_at: &updated_at,
            })
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// All office locations for an official.
    pub async fn offices_for(&self, official_id: &str) -> Result<Vec<Office>, DieselError> {
        let mut conn = self.pool.get().await?;

        offices::table
            .filter(offices::official_id.eq(official_id))
            .load::<OfficeRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Office::from).collect())
    }

    /// Replace every office location for an official.
    pub async fn replace_offices(
        &self,
        official_id: &str,
        new_offices: &[Office],
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        // Delete and re-insert atomically so readers never see a half
        // replaced office set.
        conn.transaction(|conn| {
            Box::pin(async move {
                diesel::delete(offices::table.filter(offices::official_id.eq(official_id)))
                    .execute(conn)
                    .await?;

                for office in new_offices {
                    diesel::insert_into(offices::table)
                        .values(NewOffice {
                            official_id,
                            office_type: &office.office_type,
                            address_line1: office.address_line1.as_deref(),
                            address_line2: office.address_line2.as_deref(),
                            city: office.city.as_deref(),
                            state: office.state.as_deref(),
                            zip: office.zip.as_deref(),
                            phone: office.phone.as_deref(),
                            latitude: office.location.map(|p| p.latitude),
                            longitude: office.location.map(|p| p.longitude),
                        })
                        .execute(conn)
                        .await?;
                }

                Ok(())
            })
        })
        .await
    }
}
