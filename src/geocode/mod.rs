//! Geocoding with a persistent 30-day cache.
//!
//! The `Geocoder` trait is the seam to the external provider; the
//! `GeocodeCache` wraps any geocoder with the address_cache table so a
//! repeated lookup within the TTL never touches the network.

mod nominatim;

pub use nominatim::NominatimGeocoder;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::models::{normalize_address, CacheEntry, GeoPoint};
use crate::repository::{CacheRepository, DieselError};

/// Failure modes of the external geocoding provider.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Provider returned no match for the address.
    #[error("address not found")]
    NotFound,
    /// Provider did not answer within the request timeout.
    #[error("geocoding service timeout")]
    Timeout,
    /// Transport failure or unexpected provider response.
    #[error("geocoding provider error: {0}")]
    Provider(String),
}

/// External geocoding collaborator: address string in, coordinates out.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError>;
}

/// Errors from a cached resolution: either the provider or the store failed.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error("geocode cache storage error: {0}")]
    Db(#[from] DieselError),
}

/// Geocoder wrapper backed by the persistent address cache.
#[derive(Clone)]
pub struct GeocodeCache {
    geocoder: Arc<dyn Geocoder>,
    repo: CacheRepository,
}

impl GeocodeCache {
    pub fn new(geocoder: Arc<dyn Geocoder>, repo: CacheRepository) -> Self {
        Self { geocoder, repo }
    }

    /// Resolve an address to coordinates, consulting the cache first.
    ///
    /// A live entry short-circuits the provider call. On a miss or an
    /// expired entry the provider is invoked and the result upserted with a
    /// fresh 30-day expiry. Concurrent misses for the same address may both
    /// call the provider; the last writer wins, which is fine because
    /// results for the same normalized address are stable.
    pub async fn resolve(&self, address: &str) -> Result<GeoPoint, ResolveError> {
        let normalized = normalize_address(address);
        if normalized.is_empty() {
            return Err(GeocodeError::NotFound.into());
        }

        let now = Utc::now();
        if let Some(entry) = self.repo.get_live(&normalized, now).await? {
            debug!(address = %normalized, "geocode cache hit");
            return Ok(entry.location);
        }

        let location = self.geocoder.geocode(address).await?;
        self.repo
            .upsert(&CacheEntry::new(address, location, now))
            .await?;
        debug!(address = %normalized, lat = location.latitude, lon = location.longitude, "geocoded and cached");

        Ok(location)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticGeocoder;
    use super::*;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    const NYC: GeoPoint = GeoPoint {
        latitude: 40.7128,
        longitude: -74.0060,
    };

    async fn setup(geocoder: StaticGeocoder) -> (GeocodeCache, Arc<StaticGeocoder>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let geocoder = Arc::new(geocoder);
        let cache = GeocodeCache::new(geocoder.clone(), ctx.cache());
        (cache, geocoder, dir)
    }

    #[tokio::test]
    async fn test_resolve_miss_then_hit() {
        let (cache, geocoder, _dir) =
            setup(StaticGeocoder::new(&[("123 Main St, NY", NYC)])).await;

        // Miss: provider is called once
        let point = cache.resolve("123 Main St, NY").await.unwrap();
        assert_eq!(point, NYC);
        assert_eq!(geocoder.call_count(), 1);

        // Hit: no further provider calls, same point
        let point = cache.resolve("123 Main St, NY").await.unwrap();
        assert_eq!(point, NYC);
        assert_eq!(geocoder.call_count(), 1);

        // Normalization makes differently-cased input hit too
        let point = cache.resolve("  123 MAIN st,  NY ").await.unwrap();
        assert_eq!(point, NYC);
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let (cache, geocoder, _dir) = setup(StaticGeocoder::new(&[])).await;

        let err = cache.resolve("INVALID").await.unwrap_err();
        assert!(matches!(err, ResolveError::Geocode(GeocodeError::NotFound)));
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_timeout() {
        let (cache, _geocoder, _dir) = setup(StaticGeocoder::timing_out()).await;

        let err = cache.resolve("123 Main St").await.unwrap_err();
        assert!(matches!(err, ResolveError::Geocode(GeocodeError::Timeout)));
    }

    #[tokio::test]
    async fn test_empty_address_skips_provider() {
        let (cache, geocoder, _dir) = setup(StaticGeocoder::new(&[])).await;

        let err = cache.resolve("   ").await.unwrap_err();
        assert!(matches!(err, ResolveError::Geocode(GeocodeError::NotFound)));
        assert_eq!(geocoder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();

        // Seed an already-expired entry directly
        let stale = CacheEntry::new(
            "123 Main St",
            GeoPoint::new(0.0, 0.0),
            Utc::now() - chrono::Duration::days(31),
        );
        ctx.cache().upsert(&stale).await.unwrap();

        let geocoder = Arc::new(StaticGeocoder::new(&[("123 Main St", NYC)]));
        let cache = GeocodeCache::new(geocoder.clone(), ctx.cache());

        let point = cache.resolve("123 Main St").await.unwrap();
        assert_eq!(point, NYC);
        assert_eq!(geocoder.call_count(), 1);

        // The refreshed entry is live again
        cache.resolve("123 Main St").await.unwrap();
        assert_eq!(geocoder.call_count(), 1);
    }
}
