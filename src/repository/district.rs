//! District repository with upsert-by-natural-key and containment queries.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{DistrictRecord, NewDistrict};
use super::parse_datetime;
use super::pool::{to_diesel_error, AsyncSqlitePool, DieselError};
use crate::models::{Boundary, District, GeoPoint};
use crate::schema::districts;

impl TryFrom<DistrictRecord> for District {
    type Error = DieselError;

    fn try_from(record: DistrictRecord) -> Result<Self, DieselError> {
        let boundary = Boundary::from_geojson(&record.boundary).map_err(to_diesel_error)?;
        Ok(District {
            id: record.id,
            district_type: record.district_type,
            state_fips: record.state_fips,
            district_code: record.district_code,
            name: record.name,
            boundary,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        })
    }
}

/// Repository for district rows.
#[derive(Clone)]
pub struct DistrictRepository {
    pool: AsyncSqlitePool,
}

impl DistrictRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Get a district by its natural-key slug.
    pub async fn get(&self, id: &str) -> Result<Option<District>, DieselError> {
        let mut conn = self.pool.get().await?;

        districts::table
            .find(id)
            .first::<DistrictRecord>(&mut conn)
            .await
            .optional()?
            .map(District::try_from)
            .transpose()
    }

    /// Check whether a district exists.
    pub async fn exists(&self, id: &str) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        let count: i64 = districts::table
            .filter(districts::id.eq(id))
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok(count > 0)
    }

    /// Get all districts.
    pub async fn get_all(&self) -> Result<Vec<District>, DieselError> {
        let mut conn = self.pool.get().await?;

        districts::table
            .load::<DistrictRecord>(&mut conn)
            .await?
            .into_iter()
            .map(District::try_from)
            .collect()
    }

    /// All districts whose boundary contains the point.
    ///
    /// The bounding box columns prefilter in SQL; the exact test runs on the
    /// parsed boundary. Result order is not a contract.
    pub async fn containing(&self, point: &GeoPoint) -> Result<Vec<District>, DieselError> {
        let mut conn = self.pool.get().await?;

        let candidates: Vec<DistrictRecord> = districts::table
            .filter(districts::min_lon.le(point.longitude))
            .filter(districts::max_lon.ge(point.longitude))
            .filter(districts::min_lat.le(point.latitude))
            .filter(districts::max_lat.ge(point.latitude))
            .load(&mut conn)
            .await?;

        let mut matches = Vec::new();
        for record in candidates {
            let district = District::try_from(record)?;
            if district.boundary.contains(point) {
                matches.push(district);
            }
        }
        Ok(matches)
    }

    /// Insert or update a district by its natural key.
    ///
    /// On conflict the name, boundary, and bbox are overwritten and
    /// updated_at refreshed; created_at is preserved from the existing row.
    pub async fn upsert(&self, district: &District) -> Result<(), DieselError> {
        let created_at = match self.get(&district.id).await? {
            Some(existing) => existing.created_at,
            None => district.created_at,
        };

        let mut conn = self.pool.get().await?;

        let boundary = district.boundary.to_geojson();
        let (min_lon, min_lat, max_lon, max_lat) = district.boundary.bounding_box();
        let created_at = created_at.to_rfc3339();
        let updated_at = district.updated_at.to_rfc3339();

        diesel::replace_into(districts::table)
            .values(NewDistrict {
                id: &district.id,
                district_type: &district.district_type,
                state_fips: &district.state_fips,
                district_code: &district.district_code,
                name: &district.name,
                boundary: &boundary,
                min_lon,
                min_lat,
                max_lon,
                max_lat,
                created_at: &created_at,
                updated_at: &updated_at,
            })
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}
