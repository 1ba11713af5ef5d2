//! Sync status repository: one row per named source, upsert by name.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{DataSourceRecord, NewDataSource};
use super::parse_datetime;
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::{DataSourceStatus, SyncState};
use crate::schema::data_sources;

impl From<DataSourceRecord> for DataSourceStatus {
    fn from(record: DataSourceRecord) -> Self {
        DataSourceStatus {
            source_name: record.source_name,
            status: SyncState::from_str(&record.status).unwrap_or(SyncState::Pending),
            last_sync: parse_datetime(&record.last_sync),
            error_message: record.error_message,
        }
    }
}

/// Repository for per-source sync status rows.
#[derive(Clone)]
pub struct SyncStatusRepository {
    pool: AsyncSqlitePool,
}

impl SyncStatusRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Get the status row for a source.
    pub async fn get(&self, source_name: &str) -> Result<Option<DataSourceStatus>, DieselError> {
        let mut conn = self.pool.get().await?;

        data_sources::table
            .find(source_name)
            .first::<DataSourceRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(DataSourceStatus::from))
    }

    /// Get every status row.
    pub async fn get_all(&self) -> Result<Vec<DataSourceStatus>, DieselError> {
        let mut conn = self.pool.get().await?;

        data_sources::table
            .load::<DataSourceRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(DataSourceStatus::from).collect())
    }

    /// Assert `running` for a source, overwriting any prior row.
    ///
    /// A stale `running` row from a crashed run is simply reasserted.
    pub async fn mark_running(
        &self,
        source_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        let last_sync = now.to_rfc3339();

        diesel::replace_into(data_sources::table)
            .values(NewDataSource {
                source_name,
                status: SyncState::Running.as_str(),
                last_sync: &last_sync,
                error_message: None,
            })
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Transition a source to `success`, refreshing the sync timestamp.
    pub async fn mark_success(
        &self,
        source_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        let last_sync = now.to_rfc3339();

        diesel::update(data_sources::table.find(source_name))
            .set((
                data_sources::status.eq(SyncState::Success.as_str()),
                data_sources::last_sync.eq(&last_sync),
                data_sources::error_message.eq(None::<String>),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Transition a source to `error`, recording the message.
    pub async fn mark_error(&self, source_name: &str, message: &str) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::update(data_sources::table.find(source_name))
            .set((
                data_sources::status.eq(SyncState::Error.as_str()),
                data_sources::error_message.eq(Some(message)),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    async fn setup() -> (SyncStatusRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx.sync_status(), dir)
    }

    #[tokio::test]
    async fn test_running_to_success() {
        let (repo, _dir) = setup().await;
        let started = Utc::now();

        repo.mark_running("full_sync", started).await.unwrap();
        let status = repo.get("full_sync").await.unwrap().unwrap();
        assert_eq!(status.status, SyncState::Running);
        assert_eq!(status.error_message, None);

        repo.mark_success("full_sync", Utc::now()).await.unwrap();
        let status = repo.get("full_sync").await.unwrap().unwrap();
        assert_eq!(status.status, SyncState::Success);
        assert!(status.last_sync >= started - chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_running_to_error() {
        let (repo, _dir) = setup().await;

        repo.mark_running("full_sync", Utc::now()).await.unwrap();
        repo.mark_error("full_sync", "API Error").await.unwrap();

        let status = repo.get("full_sync").await.unwrap().unwrap();
        assert_eq!(status.status, SyncState::Error);
        assert_eq!(status.error_message, Some("API Error".to_string()));
    }

    #[tokio::test]
    async fn test_one_row_per_source() {
        let (repo, _dir) = setup().await;

        // Idempotent restart: reasserting running overwrites the stale row
        repo.mark_running("full_sync", Utc::now()).await.unwrap();
        repo.mark_error("full_sync", "crash").await.unwrap();
        repo.mark_running("full_sync", Utc::now()).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, SyncState::Running);
        assert_eq!(all[0].error_message, None);
    }

    #[tokio::test]
    async fn test_missing_source() {
        let (repo, _dir) = setup().await;
        assert!(repo.get("never_ran").await.unwrap().is_none());
        assert!(repo.get_all().await.unwrap().is_empty());
    }
}
