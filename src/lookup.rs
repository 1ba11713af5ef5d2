//! Address-to-officials lookup pipeline.
//!
//! Chains the cached geocoder, district containment, and official
//! aggregation into the responses the HTTP surface serves.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::geocode::{GeocodeCache, GeocodeError, ResolveError};
use crate::models::{normalize_address, District, GeoPoint, Office, Official};
use crate::repository::{DieselError, DistrictRepository, OfficialRepository};

/// Upper bound on addresses accepted by a single bulk request.
pub const MAX_BULK_ADDRESSES: usize = 100;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("address not found")]
    AddressNotFound,
    #[error("geocoding service timeout")]
    GeocodeTimeout,
    #[error("geocoding failed: {0}")]
    GeocodeFailed(String),
    #[error("no districts found for this location")]
    NoDistrictsFound,
    #[error("too many addresses: {count} exceeds the limit of {max}")]
    TooManyAddresses { count: usize, max: usize },
    #[error("official not found: {0}")]
    OfficialNotFound(String),
    #[error("database error: {0}")]
    Db(#[from] DieselError),
}

impl From<ResolveError> for LookupError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Geocode(GeocodeError::NotFound) => LookupError::AddressNotFound,
            ResolveError::Geocode(GeocodeError::Timeout) => LookupError::GeocodeTimeout,
            ResolveError::Geocode(GeocodeError::Provider(msg)) => LookupError::GeocodeFailed(msg),
            ResolveError::Db(e) => LookupError::Db(e),
        }
    }
}

/// District summary returned in lookup responses. No boundary payload.
#[derive(Debug, Clone, Serialize)]
pub struct DistrictInfo {
    pub id: String,
    pub district_type: String,
    pub state_fips: String,
    pub district_code: String,
    pub name: String,
}

impl From<&District> for DistrictInfo {
    fn from(district: &District) -> Self {
        Self {
            id: district.id.clone(),
            district_type: district.district_type.clone(),
            state_fips: district.state_fips.clone(),
            district_code: district.district_code.clone(),
            name: district.name.clone(),
        }
    }
}

/// Official summary returned in lookup responses.
#[derive(Debug, Clone, Serialize)]
pub struct OfficialInfo {
    pub id: String,
    pub district_id: String,
    pub full_name: String,
    pub office_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl From<&Official> for OfficialInfo {
    fn from(official: &Official) -> Self {
        Self {
            id: official.id.clone(),
            district_id: official.district_id.clone(),
            full_name: official.full_name.clone(),
            office_title: official.office_title.clone(),
            party: official.party.clone(),
            email: official.email.clone(),
            phone: official.phone.clone(),
            website: official.website.clone(),
        }
    }
}

/// Full lookup response for one address.
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub address: String,
    pub normalized_address: String,
    pub location: GeoPoint,
    pub districts: Vec<DistrictInfo>,
    pub officials: Vec<OfficialInfo>,
}

/// One entry of a bulk lookup: either a response or a per-address error.
#[derive(Debug, Serialize)]
pub struct BulkItem {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<LookupResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An official with their district and office locations.
#[derive(Debug, Serialize)]
pub struct OfficialDetail {
    #[serde(flatten)]
    pub official: Official,
    pub district: Option<DistrictInfo>,
    pub offices: Vec<Office>,
}

/// The core lookup pipeline: geocode, resolve districts, aggregate officials.
#[derive(Clone)]
pub struct LookupPipeline {
    cache: GeocodeCache,
    districts: DistrictRepository,
    officials: OfficialRepository,
}

impl LookupPipeline {
    pub fn new(
        cache: GeocodeCache,
        districts: DistrictRepository,
        officials: OfficialRepository,
    ) -> Self {
        Self {
            cache,
            districts,
            officials,
        }
    }

    /// Resolve one address to its districts and officials.
    pub async fn lookup(&self, address: &str) -> Result<LookupResponse, LookupError> {
        let location = self.cache.resolve(address).await?;
        let mut response = self.lookup_point(&location).await?;
        response.address = address.to_string();
        response.normalized_address = normalize_address(address);

        info!(
            address,
            districts = response.districts.len(),
            officials = response.officials.len(),
            "address lookup complete"
        );
        Ok(response)
    }

    /// Resolve already-geocoded coordinates to districts and officials.
    ///
    /// A location inside no known district is an error; a district with no
    /// known officials is not.
    pub async fn lookup_point(&self, location: &GeoPoint) -> Result<LookupResponse, LookupError> {
        let districts = self.districts_at(location).await?;

        let district_ids: Vec<String> = districts.iter().map(|d| d.id.clone()).collect();
        let officials = self.officials.by_districts(&district_ids).await?;

        Ok(LookupResponse {
            address: String::new(),
            normalized_address: String::new(),
            location: *location,
            districts: districts.iter().map(DistrictInfo::from).collect(),
            officials: officials.iter().map(OfficialInfo::from).collect(),
        })
    }

    /// Districts containing a point, full records including boundaries.
    pub async fn districts_at(&self, location: &GeoPoint) -> Result<Vec<District>, LookupError> {
        let districts = self.districts.containing(location).await?;
        if districts.is_empty() {
            debug!(
                lat = location.latitude,
                lon = location.longitude,
                "no districts contain point"
            );
            return Err(LookupError::NoDistrictsFound);
        }
        Ok(districts)
    }

    /// Resolve many addresses, preserving input order.
    ///
    /// Per-address failures are captured in the corresponding item rather
    /// than failing the batch; only an oversized batch is rejected outright.
    pub async fn bulk_lookup(&self, addresses: &[String]) -> Result<Vec<BulkItem>, LookupError> {
        if addresses.len() > MAX_BULK_ADDRESSES {
            return Err(LookupError::TooManyAddresses {
                count: addresses.len(),
                max: MAX_BULK_ADDRESSES,
            });
        }

        let mut items = Vec::with_capacity(addresses.len());
        for address in addresses {
            let item = match self.lookup(address).await {
                Ok(response) => BulkItem {
                    address: address.clone(),
                    result: Some(response),
                    error: None,
                },
                Err(err) => BulkItem {
                    address: address.clone(),
                    result: None,
                    error: Some(err.to_string()),
                },
            };
            items.push(item);
        }
        Ok(items)
    }

    /// Fetch one official with their district and offices.
    pub async fn official_detail(&self, id: &str) -> Result<OfficialDetail, LookupError> {
        let official = self
            .officials
            .get(id)
            .await?
            .ok_or_else(|| LookupError::OfficialNotFound(id.to_string()))?;
        let district = self.districts.get(&official.district_id).await?;
        let offices = self.officials.offices_for(id).await?;

        Ok(OfficialDetail {
            official,
            district: district.as_ref().map(DistrictInfo::from),
            offices,
        })
    }

    /// All districts, for the boundary listing endpoint.
    pub async fn all_districts(&self) -> Result<Vec<District>, LookupError> {
        Ok(self.districts.get_all().await?)
    }
}
