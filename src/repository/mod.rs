//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM over SQLite via diesel-async's
//! SyncConnectionWrapper. Timestamps are stored as RFC 3339 TEXT.

pub mod cache;
pub mod context;
pub mod district;
pub mod models;
pub mod official;
pub mod pool;
pub mod sync_status;

pub use cache::CacheRepository;
pub use context::DbContext;
pub use district::DistrictRepository;
pub use official::OfficialRepository;
pub use pool::{AsyncSqlitePool, DieselError};
pub use sync_status::SyncStatusRepository;

use chrono::{DateTime, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime() {
        let parsed = parse_datetime("2026-01-15T10:30:00+00:00");
        assert_eq!(parsed.to_rfc3339(), "2026-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert_eq!(parse_datetime("garbage"), DateTime::UNIX_EPOCH);
    }
}
