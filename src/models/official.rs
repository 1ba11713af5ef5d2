//! Elected official entities and their office locations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::address::GeoPoint;

/// Natural key for an official, scoped to the upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfficialKey {
    /// Upstream provider, e.g. "openstates".
    pub source_type: String,
    /// Provider-assigned identifier.
    pub source_id: String,
}

impl OfficialKey {
    pub fn new(source_type: &str, source_id: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            source_id: source_id.to_string(),
        }
    }

    /// Stable storage id derived from the natural key.
    pub fn slug(&self) -> String {
        format!("{}:{}", self.source_type, self.source_id)
    }
}

/// An elected official tied to exactly one district.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Official {
    /// Natural-key slug, the storage primary key.
    pub id: String,
    pub source_type: String,
    pub source_id: String,
    /// Slug of the district this official represents. The district must
    /// already exist when the official is stored.
    pub district_id: String,
    pub full_name: String,
    pub office_title: String,
    pub party: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub term_start: Option<NaiveDate>,
    pub term_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Official {
    pub fn new(key: OfficialKey, district_id: &str, full_name: &str, office_title: &str) -> Self {
        let now = Utc::now();
        Self {
            id: key.slug(),
            source_type: key.source_type,
            source_id: key.source_id,
            district_id: district_id.to_string(),
            full_name: full_name.to_string(),
            office_title: office_title.to_string(),
            party: None,
            email: None,
            phone: None,
            website: None,
            term_start: None,
            term_end: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A physical office location for an official.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Office {
    /// Database row id; 0 until stored.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i32,
    pub official_id: String,
    /// e.g. "capitol", "district".
    pub office_type: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub location: Option<GeoPoint>,
}

fn is_zero(id: &i32) -> bool {
    *id == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_official_key_slug() {
        let key = OfficialKey::new("openstates", "ocd-person/123");
        assert_eq!(key.slug(), "openstates:ocd-person/123");
    }

    #[test]
    fn test_official_new() {
        let official = Official::new(
            OfficialKey::new("openstates", "123"),
            "state_senate:17:SD-1",
            "John Smith",
            "State Senator",
        );
        assert_eq!(official.id, "openstates:123");
        assert_eq!(official.district_id, "state_senate:17:SD-1");
        assert_eq!(official.party, None);
    }
}
