//! Multi-source sync engine.
//!
//! Each registered source syncs under its own status row: `running` while
//! the fetch and merge are in flight, then `success` or `error`. A failing
//! source never blocks the others, and re-running a sync is idempotent
//! because every merge is an upsert by natural key.

pub mod sources;

pub use sources::{
    BoundarySource, DistrictSource, FetchError, OfficialSource, OpenStatesSource, RawDistrict,
    RawOfficial,
};

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::{Boundary, District, Official};
use crate::repository::{DbContext, DieselError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync already running for source {0}")]
    AlreadyRunning(String),
    #[error("unknown source: {0}")]
    UnknownSource(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid geometry for district {district}")]
    Geometry { district: String },
    #[error("database error: {0}")]
    Db(#[from] DieselError),
}

/// Outcome of a sync run across one or more sources.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub districts_merged: usize,
    pub officials_merged: usize,
    /// Officials skipped because their district is not stored, as
    /// "official-slug: unknown district district-slug".
    pub rejected: Vec<String>,
    /// Sources that aborted, as (source name, error message).
    pub failed: Vec<(String, String)>,
}

/// Releases the in-process single-flight lease when the sync run ends.
struct SourceLease {
    running: Arc<Mutex<HashSet<String>>>,
    name: String,
}

impl Drop for SourceLease {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.name);
    }
}

/// Coordinates fetching from registered sources and merging into storage.
pub struct SyncEngine {
    ctx: DbContext,
    district_sources: Vec<Arc<dyn DistrictSource>>,
    official_sources: Vec<Arc<dyn OfficialSource>>,
    running: Arc<Mutex<HashSet<String>>>,
}

impl SyncEngine {
    pub fn new(ctx: DbContext) -> Self {
        Self {
            ctx,
            district_sources: Vec::new(),
            official_sources: Vec::new(),
            running: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn add_district_source(&mut self, source: Arc<dyn DistrictSource>) {
        self.district_sources.push(source);
    }

    pub fn add_official_source(&mut self, source: Arc<dyn OfficialSource>) {
        self.official_sources.push(source);
    }

    /// Names of every registered source. Districts sync before officials,
    /// so boundary sources are listed first.
    pub fn source_names(&self) -> Vec<String> {
        self.district_sources
            .iter()
            .map(|s| s.name().to_string())
            .chain(self.official_sources.iter().map(|s| s.name().to_string()))
            .collect()
    }

    /// Sync every registered source, districts first.
    ///
    /// Per-source failures land in the report; the run itself only fails if
    /// nothing could even start.
    pub async fn run_all(&self) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        for source in &self.district_sources {
            if let Err(e) = self.run_district_source(source.as_ref(), &mut report).await {
                report.failed.push((source.name().to_string(), e.to_string()));
            }
        }
        for source in &self.official_sources {
            if let Err(e) = self.run_official_source(source.as_ref(), &mut report).await {
                report.failed.push((source.name().to_string(), e.to_string()));
            }
        }

        info!(
            districts = report.districts_merged,
            officials = report.officials_merged,
            rejected = report.rejected.len(),
            failed = report.failed.len(),
            "sync run complete"
        );
        Ok(report)
    }

    /// Sync a single source by name.
    pub async fn run_source(&self, name: &str) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        if let Some(source) = self.district_sources.iter().find(|s| s.name() == name) {
            self.run_district_source(source.as_ref(), &mut report).await?;
            return Ok(report);
        }
        if let Some(source) = self.official_sources.iter().find(|s| s.name() == name) {
            self.run_official_source(source.as_ref(), &mut report).await?;
            return Ok(report);
        }
        Err(SyncError::UnknownSource(name.to_string()))
    }

    fn acquire(&self, name: &str) -> Result<SourceLease, SyncError> {
        let mut set = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(name.to_string()) {
            return Err(SyncError::AlreadyRunning(name.to_string()));
        }
        Ok(SourceLease {
            running: self.running.clone(),
            name: name.to_string(),
        })
    }

    async fn run_district_source(
        &self,
        source: &dyn DistrictSource,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let name = source.name().to_string();
        let _lease = self.acquire(&name)?;
        let status = self.ctx.sync_status();
        status.mark_running(&name, Utc::now()).await?;

        match self.merge_districts(source).await {
            Ok(count) => {
                status.mark_success(&name, Utc::now()).await?;
                report.districts_merged += count;
                Ok(())
            }
            Err(e) => {
                if let Err(db) = status.mark_error(&name, &e.to_string()).await {
                    error!(source = %name, error = %db, "failed to record sync error");
                }
                Err(e)
            }
        }
    }

    async fn run_official_source(
        &self,
        source: &dyn OfficialSource,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let name = source.name().to_string();
        let _lease = self.acquire(&name)?;
        let status = self.ctx.sync_status();
        status.mark_running(&name, Utc::now()).await?;

        match self.merge_officials(source, report).await {
            Ok(count) => {
                status.mark_success(&name, Utc::now()).await?;
                report.officials_merged += count;
                Ok(())
            }
            Err(e) => {
                if let Err(db) = status.mark_error(&name, &e.to_string()).await {
                    error!(source = %name, error = %db, "failed to record sync error");
                }
                Err(e)
            }
        }
    }

    async fn merge_districts(&self, source: &dyn DistrictSource) -> Result<usize, SyncError> {
        let raw = source.fetch().await?;
        let repo = self.ctx.districts();
        let mut merged = 0;

        for district in raw {
            let slug = district.key.slug();
            let boundary = Boundary::from_value(district.geometry)
                .ok()
                .filter(Boundary::is_valid)
                .ok_or_else(|| SyncError::Geometry {
                    district: slug.clone(),
                })?;

            repo.upsert(&District::new(district.key, &district.name, boundary))
                .await?;
            merged += 1;
        }

        info!(source = source.name(), merged, "districts merged");
        Ok(merged)
    }

    async fn merge_officials(
        &self,
        source: &dyn OfficialSource,
        report: &mut SyncReport,
    ) -> Result<usize, SyncError> {
        let raw = source.fetch().await?;
        let districts = self.ctx.districts();
        let repo = self.ctx.officials();
        let mut merged = 0;

        for official in raw {
            let district_id = official.district.slug();
            if !districts.exists(&district_id).await? {
                let slug = official.key.slug();
                warn!(official = %slug, district = %district_id, "rejecting official, district unknown");
                report
                    .rejected
                    .push(format!("{}: unknown district {}", slug, district_id));
                continue;
            }

            let mut record = Official::new(
                official.key,
                &district_id,
                &official.full_name,
                &official.office_title,
            );
            record.party = official.party;
            record.email = official.email;
            record.phone = official.phone;
            record.website = official.website;
            record.term_start = official.term_start;
            record.term_end = official.term_end;

            repo.upsert(&record).await?;
            repo.replace_offices(&record.id, &official.offices).await?;
            merged += 1;
        }

        info!(source = source.name(), merged, "officials merged");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistrictKey, Office, OfficialKey, SyncState};
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::tempdir;

    struct StaticDistricts {
        name: &'static str,
        districts: Vec<RawDistrict>,
        fail: Option<&'static str>,
    }

    #[async_trait]
    impl DistrictSource for StaticDistricts {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self) -> Result<Vec<RawDistrict>, FetchError> {
            match self.fail {
                Some(message) => Err(FetchError::Upstream(message.to_string())),
                None => Ok(self.districts.clone()),
            }
        }
    }

    struct StaticOfficials {
        name: &'static str,
        officials: Vec<RawOfficial>,
        fail: Option<&'static str>,
    }

    #[async_trait]
    impl OfficialSource for StaticOfficials {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self) -> Result<Vec<RawOfficial>, FetchError> {
            match self.fail {
                Some(message) => Err(FetchError::Upstream(message.to_string())),
                None => Ok(self.officials.clone()),
            }
        }
    }

    fn square_geometry() -> serde_json::Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
        })
    }

    fn raw_district(code: &str) -> RawDistrict {
        RawDistrict {
            key: DistrictKey::new("state_senate", "36", code),
            name: format!("Senate District {}", code),
            geometry: square_geometry(),
        }
    }

    fn raw_official(source_id: &str, district_code: &str) -> RawOfficial {
        RawOfficial {
            key: OfficialKey::new("openstates", source_id),
            district: DistrictKey::new("state_senate", "36", district_code),
            full_name: "Jane Doe".to_string(),
            office_title: "Senator".to_string(),
            party: Some("Democratic".to_string()),
            email: None,
            phone: None,
            website: None,
            term_start: None,
            term_end: None,
            offices: vec![Office {
                office_type: "capitol".to_string(),
                address_line1: Some("State Capitol".to_string()),
                ..Default::default()
            }],
        }
    }

    async fn setup() -> (DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx, dir)
    }

    #[tokio::test]
    async fn test_full_sync() {
        let (ctx, _dir) = setup().await;
        let mut engine = SyncEngine::new(ctx.clone());
        engine.add_district_source(Arc::new(StaticDistricts {
            name: "boundaries",
            districts: vec![raw_district("27")],
            fail: None,
        }));
        engine.add_official_source(Arc::new(StaticOfficials {
            name: "openstates",
            officials: vec![raw_official("abc", "27")],
            fail: None,
        }));

        let report = engine.run_all().await.unwrap();
        assert_eq!(report.districts_merged, 1);
        assert_eq!(report.officials_merged, 1);
        assert!(report.rejected.is_empty());
        assert!(report.failed.is_empty());

        let district = ctx.districts().get("state_senate:36:27").await.unwrap();
        assert!(district.is_some());
        let official = ctx.officials().get("openstates:abc").await.unwrap().unwrap();
        assert_eq!(official.district_id, "state_senate:36:27");
        let offices = ctx.officials().offices_for("openstates:abc").await.unwrap();
        assert_eq!(offices.len(), 1);

        for name in ["boundaries", "openstates"] {
            let status = ctx.sync_status().get(name).await.unwrap().unwrap();
            assert_eq!(status.status, SyncState::Success);
            assert_eq!(status.error_message, None);
        }
    }

    #[tokio::test]
    async fn test_sync_idempotent() {
        let (ctx, _dir) = setup().await;
        let mut engine = SyncEngine::new(ctx.clone());
        engine.add_district_source(Arc::new(StaticDistricts {
            name: "boundaries",
            districts: vec![raw_district("27")],
            fail: None,
        }));
        engine.add_official_source(Arc::new(StaticOfficials {
            name: "openstates",
            officials: vec![raw_official("abc", "27")],
            fail: None,
        }));

        engine.run_all().await.unwrap();
        let first = ctx.officials().get("openstates:abc").await.unwrap().unwrap();
        engine.run_all().await.unwrap();
        let second = ctx.officials().get("openstates:abc").await.unwrap().unwrap();

        assert_eq!(ctx.districts().get_all().await.unwrap().len(), 1);
        assert_eq!(ctx.officials().get_all().await.unwrap().len(), 1);
        assert_eq!(first.created_at, second.created_at);
        // Offices are replaced wholesale, not duplicated
        assert_eq!(
            ctx.officials().offices_for("openstates:abc").await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_official_without_district_is_rejected() {
        let (ctx, _dir) = setup().await;
        let mut engine = SyncEngine::new(ctx.clone());
        engine.add_official_source(Arc::new(StaticOfficials {
            name: "openstates",
            officials: vec![raw_official("abc", "99")],
            fail: None,
        }));

        let report = engine.run_all().await.unwrap();
        assert_eq!(report.officials_merged, 0);
        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].contains("state_senate:36:99"));
        assert!(report.failed.is_empty());

        // Rejection is not a source failure
        let status = ctx.sync_status().get("openstates").await.unwrap().unwrap();
        assert_eq!(status.status, SyncState::Success);
        assert!(ctx.officials().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_source_records_error_and_isolates() {
        let (ctx, _dir) = setup().await;
        let mut engine = SyncEngine::new(ctx.clone());
        engine.add_district_source(Arc::new(StaticDistricts {
            name: "boundaries",
            districts: vec![raw_district("27")],
            fail: None,
        }));
        engine.add_official_source(Arc::new(StaticOfficials {
            name: "openstates",
            officials: vec![],
            fail: Some("API Error"),
        }));

        let report = engine.run_all().await.unwrap();
        assert_eq!(report.districts_merged, 1);
        assert_eq!(report.failed, vec![("openstates".to_string(), "API Error".to_string())]);

        let status = ctx.sync_status().get("openstates").await.unwrap().unwrap();
        assert_eq!(status.status, SyncState::Error);
        assert_eq!(status.error_message, Some("API Error".to_string()));

        let status = ctx.sync_status().get("boundaries").await.unwrap().unwrap();
        assert_eq!(status.status, SyncState::Success);
    }

    #[tokio::test]
    async fn test_invalid_geometry_fails_source() {
        let (ctx, _dir) = setup().await;
        let mut engine = SyncEngine::new(ctx.clone());
        engine.add_district_source(Arc::new(StaticDistricts {
            name: "boundaries",
            districts: vec![RawDistrict {
                key: DistrictKey::new("state_senate", "36", "27"),
                name: "Bad".to_string(),
                geometry: json!({"type": "Point", "coordinates": [0.0, 0.0]}),
            }],
            fail: None,
        }));

        let err = engine.run_source("boundaries").await.unwrap_err();
        assert!(matches!(err, SyncError::Geometry { .. }));

        let status = ctx.sync_status().get("boundaries").await.unwrap().unwrap();
        assert_eq!(status.status, SyncState::Error);
    }

    #[tokio::test]
    async fn test_run_source_unknown() {
        let (ctx, _dir) = setup().await;
        let engine = SyncEngine::new(ctx);

        let err = engine.run_source("nope").await.unwrap_err();
        assert!(matches!(err, SyncError::UnknownSource(_)));
    }

    #[tokio::test]
    async fn test_single_flight() {
        let (ctx, _dir) = setup().await;
        let mut engine = SyncEngine::new(ctx);
        engine.add_district_source(Arc::new(StaticDistricts {
            name: "boundaries",
            districts: vec![],
            fail: None,
        }));

        // Simulate a concurrent run holding the lease
        let lease = engine.acquire("boundaries").unwrap();
        let err = engine.run_source("boundaries").await.unwrap_err();
        assert!(matches!(err, SyncError::AlreadyRunning(_)));

        // Dropping the lease frees the source again
        drop(lease);
        engine.run_source("boundaries").await.unwrap();
    }
}
