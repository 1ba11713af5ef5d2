//! Geographic district entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geometry::Boundary;

/// Natural key for a district, independent of any upstream source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistrictKey {
    /// Kind of district, e.g. "state_senate", "congressional".
    pub district_type: String,
    /// State FIPS code, e.g. "17".
    pub state_fips: String,
    /// District code within the state, e.g. "SD-1".
    pub district_code: String,
}

impl DistrictKey {
    pub fn new(district_type: &str, state_fips: &str, district_code: &str) -> Self {
        Self {
            district_type: district_type.to_string(),
            state_fips: state_fips.to_string(),
            district_code: district_code.to_string(),
        }
    }

    /// Stable storage id derived from the natural key.
    ///
    /// Upserting the same district twice always lands on the same row, so
    /// officials referencing it are never re-keyed.
    pub fn slug(&self) -> String {
        format!(
            "{}:{}:{}",
            self.district_type, self.state_fips, self.district_code
        )
    }
}

/// A geographic district with its boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct District {
    /// Natural-key slug, the storage primary key.
    pub id: String,
    pub district_type: String,
    pub state_fips: String,
    pub district_code: String,
    pub name: String,
    pub boundary: Boundary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl District {
    pub fn new(key: DistrictKey, name: &str, boundary: Boundary) -> Self {
        let now = Utc::now();
        Self {
            id: key.slug(),
            district_type: key.district_type,
            state_fips: key.state_fips,
            district_code: key.district_code,
            name: name.to_string(),
            boundary,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> DistrictKey {
        DistrictKey::new(&self.district_type, &self.state_fips, &self.district_code)
    }
}
