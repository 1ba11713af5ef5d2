//! Address normalization and geocode cache entries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a cached geocode result stays live.
pub const CACHE_TTL_DAYS: i64 = 30;

/// Normalize a raw address string for use as a cache and dedup key.
///
/// Lowercases, trims, and collapses internal whitespace. Deterministic and
/// idempotent: `normalize_address(normalize_address(a)) == normalize_address(a)`.
pub fn normalize_address(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A WGS84 coordinate pair.
///
/// In the lookup path these are produced only by geocoding, never taken
/// directly from user input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A cached geocode result, keyed by normalized address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Raw address as originally submitted.
    pub address: String,
    /// Normalized form, the upsert key.
    pub normalized_address: String,
    /// Geocoded location.
    pub location: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a fresh entry expiring `CACHE_TTL_DAYS` from `now`.
    pub fn new(address: &str, location: GeoPoint, now: DateTime<Utc>) -> Self {
        Self {
            address: address.to_string(),
            normalized_address: normalize_address(address),
            location,
            created_at: now,
            expires_at: now + Duration::days(CACHE_TTL_DAYS),
        }
    }

    /// An entry is live strictly before its expiry; at `expires_at` exactly
    /// it is already expired.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_trims() {
        assert_eq!(normalize_address("  123 Main St, NY  "), "123 main st, ny");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize_address("123   Main\t St,\n NY"),
            "123 main st, ny"
        );
    }

    #[test]
    fn test_normalize_idempotent() {
        let raw = "  456 ELM   Ave,  Springfield ";
        let once = normalize_address(raw);
        assert_eq!(normalize_address(&once), once);
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_address("   "), "");
    }

    #[test]
    fn test_cache_entry_expiry_exclusive() {
        let now = Utc::now();
        let entry = CacheEntry::new("123 Main St", GeoPoint::new(40.0, -74.0), now);

        // Live strictly before expiry
        assert!(entry.is_live(now));
        assert!(entry.is_live(entry.expires_at - Duration::seconds(1)));
        // Exactly at expires_at the entry is expired
        assert!(!entry.is_live(entry.expires_at));
        assert!(!entry.is_live(entry.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_cache_entry_ttl() {
        let now = Utc::now();
        let entry = CacheEntry::new("123 Main St", GeoPoint::new(40.0, -74.0), now);
        assert_eq!(entry.expires_at - entry.created_at, Duration::days(30));
        assert_eq!(entry.normalized_address, "123 main st");
    }
}
