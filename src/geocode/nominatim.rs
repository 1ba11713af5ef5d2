//! Nominatim HTTP geocoder.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{GeocodeError, Geocoder};
use crate::models::GeoPoint;

/// One place in a Nominatim search response. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoder backed by a Nominatim-compatible search endpoint.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Build a geocoder for the given endpoint.
    ///
    /// Nominatim's usage policy requires an identifying User-Agent.
    pub fn new(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        Url::parse(base_url)
            .map_err(|e| GeocodeError::Provider(format!("bad geocoder url: {}", e)))?;
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodeError::Provider(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        debug!(%url, address, "querying geocoder");

        let response = self
            .client
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodeError::Timeout
                } else {
                    GeocodeError::Provider(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GeocodeError::Provider(format!(
                "HTTP {} from geocoder",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Provider(e.to_string()))?;

        let place = places.first().ok_or(GeocodeError::NotFound)?;
        let latitude = place
            .lat
            .parse::<f64>()
            .map_err(|e| GeocodeError::Provider(format!("bad latitude: {}", e)))?;
        let longitude = place
            .lon
            .parse::<f64>()
            .map_err(|e| GeocodeError::Provider(format!("bad longitude: {}", e)))?;

        Ok(GeoPoint::new(latitude, longitude))
    }
}
