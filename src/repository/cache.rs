//! Geocode cache repository.
//!
//! One row per normalized address; expiry is evaluated at read time in Rust
//! against parsed timestamps, so the boundary is exact: an entry with
//! `expires_at == now` is already expired.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{CacheRecord, NewCacheEntry};
use super::parse_datetime;
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::{CacheEntry, GeoPoint};
use crate::schema::address_cache;

impl From<CacheRecord> for CacheEntry {
    fn from(record: CacheRecord) -> Self {
        CacheEntry {
            address: record.address,
            normalized_address: record.normalized_address,
            location: GeoPoint::new(record.latitude, record.longitude),
            created_at: parse_datetime(&record.created_at),
            expires_at: parse_datetime(&record.expires_at),
        }
    }
}

/// Repository for the address geocode cache.
#[derive(Clone)]
pub struct CacheRepository {
    pool: AsyncSqlitePool,
}

impl CacheRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Get the entry for a normalized address regardless of expiry.
    pub async fn get(&self, normalized: &str) -> Result<Option<CacheEntry>, DieselError> {
        let mut conn = self.pool.get().await?;

        address_cache::table
            .find(normalized)
            .first::<CacheRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(CacheEntry::from))
    }

    /// Get the live entry for a normalized address, if any.
    pub async fn get_live(
        &self,
        normalized: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, DieselError> {
        Ok(self.get(normalized).await?.filter(|e| e.is_live(now)))
    }

    /// Insert or replace the entry for its normalized address.
    pub async fn upsert(&self, entry: &CacheEntry) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = entry.created_at.to_rfc3339();
        let expires_at = entry.expires_at.to_rfc3339();

        diesel::replace_into(address_cache::table)
            .values(NewCacheEntry {
                normalized_address: &entry.normalized_address,
                address: &entry.address,
                latitude: entry.location.latitude,
                longitude: entry.location.longitude,
                created_at: &created_at,
                expires_at: &expires_at,
            })
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use chrono::Duration;
    use tempfile::tempdir;

    async fn setup() -> (CacheRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx.cache(), dir)
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let (repo, _dir) = setup().await;
        let now = Utc::now();
        let entry = CacheEntry::new("123 Main St, NY", GeoPoint::new(40.7128, -74.0060), now);

        repo.upsert(&entry).await.unwrap();

        let fetched = repo.get_live("123 main st, ny", now).await.unwrap().unwrap();
        assert_eq!(fetched.location, entry.location);
        assert_eq!(fetched.address, "123 Main St, NY");
    }

    #[tokio::test]
    async fn test_miss() {
        let (repo, _dir) = setup().await;
        assert!(repo
            .get_live("nowhere", Utc::now())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_not_live() {
        let (repo, _dir) = setup().await;
        let created = Utc::now() - Duration::days(31);
        let entry = CacheEntry::new("123 Main St", GeoPoint::new(40.0, -74.0), created);

        repo.upsert(&entry).await.unwrap();

        // Still stored, but no longer live
        assert!(repo.get("123 main st").await.unwrap().is_some());
        assert!(repo
            .get_live("123 main st", Utc::now())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_expiry_boundary_exclusive() {
        let (repo, _dir) = setup().await;
        let now = Utc::now();
        let entry = CacheEntry::new("123 Main St", GeoPoint::new(40.0, -74.0), now);

        repo.upsert(&entry).await.unwrap();

        let expires_at = repo.get("123 main st").await.unwrap().unwrap().expires_at;
        assert!(repo
            .get_live("123 main st", expires_at)
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .get_live("123 main st", expires_at - Duration::seconds(1))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let (repo, _dir) = setup().await;
        let now = Utc::now();

        repo.upsert(&CacheEntry::new(
            "123 Main St",
            GeoPoint::new(1.0, 1.0),
            now,
        ))
        .await
        .unwrap();
        repo.upsert(&CacheEntry::new(
            "123 MAIN ST",
            GeoPoint::new(2.0, 2.0),
            now,
        ))
        .await
        .unwrap();

        // Last writer wins on the shared normalized key
        let fetched = repo.get_live("123 main st", now).await.unwrap().unwrap();
        assert_eq!(fetched.location, GeoPoint::new(2.0, 2.0));
    }
}
