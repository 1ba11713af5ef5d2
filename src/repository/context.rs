//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for all database operations.
//! It holds the connection pool and provides access to all repositories.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::cache::CacheRepository;
use super::district::DistrictRepository;
use super::official::OfficialRepository;
use super::pool::{AsyncSqlitePool, DieselError};
use super::sync_status::SyncStatusRepository;

/// Database context that manages the connection pool and provides repository access.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::new(&db_path);
/// ctx.init_schema().await?;
/// let districts = ctx.districts().containing(&point).await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: AsyncSqlitePool,
}

impl DbContext {
    /// Create a context from a database file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Create a context from a database URL (`sqlite:` URLs or plain paths).
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(database_url),
        }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &AsyncSqlitePool {
        &self.pool
    }

    /// Get the geocode cache repository.
    pub fn cache(&self) -> CacheRepository {
        CacheRepository::new(self.pool.clone())
    }

    /// Get the district repository.
    pub fn districts(&self) -> DistrictRepository {
        DistrictRepository::new(self.pool.clone())
    }

    /// Get the official repository.
    pub fn officials(&self) -> OfficialRepository {
        OfficialRepository::new(self.pool.clone())
    }

    /// Get the sync status repository.
    pub fn sync_status(&self) -> SyncStatusRepository {
        SyncStatusRepository::new(self.pool.clone())
    }

    /// Initialize the database schema.
    ///
    /// Creates the necessary tables and indexes if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            -- Geocode cache, one live entry per normalized address
            CREATE TABLE IF NOT EXISTS address_cache (
                normalized_address TEXT PRIMARY KEY,
                address TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            -- Districts, keyed by natural-key slug "{type}:{fips}:{code}"
            CREATE TABLE IF NOT EXISTS districts (
                id TEXT PRIMARY KEY,
                district_type TEXT NOT NULL,
                state_fips TEXT NOT NULL,
                district_code TEXT NOT NULL,
                name TEXT NOT NULL,
                boundary TEXT NOT NULL,
                min_lon REAL NOT NULL,
                min_lat REAL NOT NULL,
                max_lon REAL NOT NULL,
                max_lat REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(district_type, state_fips, district_code)
            );

            -- Officials, keyed by natural-key slug "{source_type}:{source_id}"
            CREATE TABLE IF NOT EXISTS officials (
                id TEXT PRIMARY KEY,
                source_type TEXT NOT NULL,
                source_id TEXT NOT NULL,
                district_id TEXT NOT NULL,
                full_name TEXT NOT NULL,
                office_title TEXT NOT NULL,
                party TEXT,
                email TEXT,
                phone TEXT,
                website TEXT,
                term_start TEXT,
                term_end TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(source_type, source_id),
                FOREIGN KEY (district_id) REFERENCES districts(id)
            );

            -- Physical office locations per official
            CREATE TABLE IF NOT EXISTS offices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                official_id TEXT NOT NULL,
                office_type TEXT NOT NULL,
                address_line1 TEXT,
                address_line2 TEXT,
                city TEXT,
                state TEXT,
                zip TEXT,
                phone TEXT,
                latitude REAL,
                longitude REAL,
                FOREIGN KEY (official_id) REFERENCES officials(id)
            );

            -- Sync status, one row per named source
            CREATE TABLE IF NOT EXISTS data_sources (
                source_name TEXT PRIMARY KEY,
                status TEXT NOT NULL DEFAULT 'pending',
                last_sync TEXT NOT NULL,
                error_message TEXT
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_districts_bbox ON districts(min_lon, max_lon, min_lat, max_lat);
            CREATE INDEX IF NOT EXISTS idx_officials_district ON officials(district_id);
            CREATE INDEX IF NOT EXISTS idx_offices_official ON offices(official_id);
            CREATE INDEX IF NOT EXISTS idx_address_cache_expiry ON address_cache(expires_at);
            "#,
        )
        .await
    }

    /// Get list of all tables in the database.
    pub async fn list_tables(&self) -> Result<Vec<String>, DieselError> {
        use diesel_async::RunQueryDsl;

        let mut conn = self.pool.get().await?;
        let rows: Vec<TableName> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .load(&mut conn)
        .await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }
}

#[derive(diesel::QueryableByName)]
struct TableName {
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_schema() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));

        ctx.init_schema().await.unwrap();

        let tables = ctx.list_tables().await.unwrap();
        assert!(tables.contains(&"address_cache".to_string()));
        assert!(tables.contains(&"districts".to_string()));
        assert!(tables.contains(&"officials".to_string()));
        assert!(tables.contains(&"offices".to_string()));
        assert!(tables.contains(&"data_sources".to_string()));

        // Re-initialization is a no-op
        ctx.init_schema().await.unwrap();
    }
}
