//! Upstream data sources for the sync engine.
//!
//! Each source speaks one provider's wire format and normalizes it into
//! `RawDistrict`/`RawOfficial` records keyed by natural keys. Transport and
//! HTTP failures inside a source degrade to an empty batch with an error
//! log; only configuration problems surface as `FetchError`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use crate::models::{DistrictKey, Office, OfficialKey};

#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream reported a failure the source chose not to absorb.
    #[error("{0}")]
    Upstream(String),
    /// The source is not usable as configured.
    #[error("source misconfigured: {0}")]
    Config(String),
}

/// A district as delivered by an upstream, before storage.
#[derive(Debug, Clone)]
pub struct RawDistrict {
    pub key: DistrictKey,
    pub name: String,
    /// GeoJSON geometry, validated at merge time.
    pub geometry: serde_json::Value,
}

/// An official as delivered by an upstream, before storage.
///
/// The district is referenced by natural key; merge resolves it to a stored
/// district and rejects the record if none exists.
#[derive(Debug, Clone)]
pub struct RawOfficial {
    pub key: OfficialKey,
    pub district: DistrictKey,
    pub full_name: String,
    pub office_title: String,
    pub party: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub term_start: Option<NaiveDate>,
    pub term_end: Option<NaiveDate>,
    pub offices: Vec<Office>,
}

/// An upstream providing district boundaries.
#[async_trait]
pub trait DistrictSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self) -> Result<Vec<RawDistrict>, FetchError>;
}

/// An upstream providing officials.
#[async_trait]
pub trait OfficialSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self) -> Result<Vec<RawOfficial>, FetchError>;
}

fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Config(e.to_string()))
}

// GeoJSON FeatureCollection wire types for the boundary feed.

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
    geometry: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    district_type: String,
    state_fips: String,
    district_code: String,
    name: String,
}

/// District boundaries from a GeoJSON FeatureCollection feed.
pub struct BoundarySource {
    client: Client,
    url: String,
}

impl BoundarySource {
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(user_agent, timeout)?,
            url: url.to_string(),
        })
    }

    fn parse(collection: FeatureCollection) -> Vec<RawDistrict> {
        collection
            .features
            .into_iter()
            .map(|feature| RawDistrict {
                key: DistrictKey::new(
                    &feature.properties.district_type,
                    &feature.properties.state_fips,
                    &feature.properties.district_code,
                ),
                name: feature.properties.name,
                geometry: feature.geometry,
            })
            .collect()
    }
}

#[async_trait]
impl DistrictSource for BoundarySource {
    fn name(&self) -> &str {
        "boundaries"
    }

    async fn fetch(&self) -> Result<Vec<RawDistrict>, FetchError> {
        let response = match self.client.get(&self.url).send().await {
            Ok(r) => r,
            Err(e) => {
                error!(url = %self.url, error = %e, "boundary feed unreachable");
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            error!(url = %self.url, status = %response.status(), "boundary feed rejected request");
            return Ok(Vec::new());
        }

        match response.json::<FeatureCollection>().await {
            Ok(collection) => {
                let districts = Self::parse(collection);
                info!(count = districts.len(), "fetched district boundaries");
                Ok(districts)
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "boundary feed returned malformed GeoJSON");
                Ok(Vec::new())
            }
        }
    }
}

// OpenStates people API wire types.

#[derive(Debug, Deserialize)]
struct OpenStatesResponse {
    results: Vec<OpenStatesPerson>,
}

#[derive(Debug, Deserialize)]
struct OpenStatesPerson {
    id: String,
    name: String,
    #[serde(default)]
    party: Option<String>,
    #[serde(default)]
    email: Option<String>,
    current_role: Option<OpenStatesRole>,
    #[serde(default)]
    offices: Vec<OpenStatesOffice>,
}

#[derive(Debug, Deserialize)]
struct OpenStatesRole {
    title: String,
    district: String,
    org_classification: String,
}

#[derive(Debug, Deserialize)]
struct OpenStatesOffice {
    #[serde(default)]
    classification: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    voice: Option<String>,
}

/// State legislators from the OpenStates people API.
pub struct OpenStatesSource {
    client: Client,
    base_url: String,
    api_key: String,
    jurisdiction: String,
    state_fips: String,
}

impl OpenStatesSource {
    pub fn new(
        base_url: &str,
        api_key: &str,
        jurisdiction: &str,
        state_fips: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        if api_key.is_empty() {
            return Err(FetchError::Config("missing OpenStates API key".to_string()));
        }
        Ok(Self {
            client: build_client(user_agent, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            jurisdiction: jurisdiction.to_string(),
            state_fips: state_fips.to_string(),
        })
    }

    fn district_type(org_classification: &str) -> &'static str {
        match org_classification {
            "upper" => "state_senate",
            "lower" => "state_house",
            other => {
                info!(classification = other, "unmapped chamber, keeping as legislature");
                "legislature"
            }
        }
    }

    fn convert(&self, person: OpenStatesPerson) -> Option<RawOfficial> {
        // People without a current role cannot be tied to a district
        let role = person.current_role?;

        let offices = person
            .offices
            .into_iter()
            .map(|office| Office {
                office_type: office.classification.unwrap_or_else(|| "unknown".to_string()),
                address_line1: office.address,
                phone: office.voice,
                ..Default::default()
            })
            .collect();

        Some(RawOfficial {
            key: OfficialKey::new("openstates", &person.id),
            district: DistrictKey::new(
                Self::district_type(&role.org_classification),
                &self.state_fips,
                &role.district,
            ),
            full_name: person.name,
            office_title: role.title,
            party: person.party,
            email: person.email,
            phone: None,
            website: None,
            term_start: None,
            term_end: None,
            offices,
        })
    }
}

#[async_trait]
impl OfficialSource for OpenStatesSource {
    fn name(&self) -> &str {
        "openstates"
    }

    async fn fetch(&self) -> Result<Vec<RawOfficial>, FetchError> {
        let url = format!("{}/people", self.base_url);
        let response = match self
            .client
            .get(&url)
            .query(&[
                ("jurisdiction", self.jurisdiction.as_str()),
                ("include", "offices"),
                ("per_page", "50"),
            ])
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!(%url, error = %e, "openstates unreachable");
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            error!(%url, status = %response.status(), "openstates rejected request");
            return Ok(Vec::new());
        }

        match response.json::<OpenStatesResponse>().await {
            Ok(body) => {
                let officials: Vec<RawOfficial> = body
                    .results
                    .into_iter()
                    .filter_map(|person| self.convert(person))
                    .collect();
                info!(count = officials.len(), "fetched officials from openstates");
                Ok(officials)
            }
            Err(e) => {
                error!(%url, error = %e, "openstates returned malformed response");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_collection_parsing() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {
                    "district_type": "state_senate",
                    "state_fips": "36",
                    "district_code": "SD-27",
                    "name": "State Senate District 27"
                },
                "geometry": {"type": "Polygon", "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]}
            }]
        }"#;

        let collection: FeatureCollection = serde_json::from_str(body).unwrap();
        let districts = BoundarySource::parse(collection);
        assert_eq!(districts.len(), 1);
        assert_eq!(districts[0].key.slug(), "state_senate:36:SD-27");
        assert_eq!(districts[0].name, "State Senate District 27");
        assert_eq!(districts[0].geometry["type"], "Polygon");
    }

    #[test]
    fn test_openstates_conversion() {
        let source = OpenStatesSource::new(
            "https://v3.openstates.org",
            "test-key",
            "New York",
            "36",
            "civichub-test",
            Duration::from_secs(5),
        )
        .unwrap();

        let body = r#"{
            "results": [
                {
                    "id": "ocd-person/123",
                    "name": "Jane Doe",
                    "party": "Democratic",
                    "email": "jane@senate.gov",
                    "current_role": {
                        "title": "Senator",
                        "district": "27",
                        "org_classification": "upper"
                    },
                    "offices": [
                        {"classification": "capitol", "address": "State Capitol", "voice": "555-0100"}
                    ]
                },
                {
                    "id": "ocd-person/456",
                    "name": "No Role",
                    "current_role": null
                }
            ]
        }"#;

        let parsed: OpenStatesResponse = serde_json::from_str(body).unwrap();
        let officials: Vec<RawOfficial> = parsed
            .results
            .into_iter()
            .filter_map(|p| source.convert(p))
            .collect();

        // The person without a current role is skipped
        assert_eq!(officials.len(), 1);
        let official = &officials[0];
        assert_eq!(official.key.slug(), "openstates:ocd-person/123");
        assert_eq!(official.district.slug(), "state_senate:36:27");
        assert_eq!(official.office_title, "Senator");
        assert_eq!(official.offices.len(), 1);
        assert_eq!(official.offices[0].phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_openstates_requires_api_key() {
        let result = OpenStatesSource::new(
            "https://v3.openstates.org",
            "",
            "New York",
            "36",
            "civichub-test",
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(FetchError::Config(_))));
    }

    #[test]
    fn test_district_type_mapping() {
        assert_eq!(OpenStatesSource::district_type("upper"), "state_senate");
        assert_eq!(OpenStatesSource::district_type("lower"), "state_house");
        assert_eq!(OpenStatesSource::district_type("weird"), "legislature");
    }
}
