//! HTTP API server for civic data lookups.
//!
//! Serves address-to-officials resolution, district boundaries as GeoJSON,
//! official details, and sync status over a JSON API.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::geocode::{GeocodeCache, NominatimGeocoder};
use crate::lookup::LookupPipeline;
use crate::repository::SyncStatusRepository;

/// Shared state for the API server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LookupPipeline>,
    pub status_repo: SyncStatusRepository,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let ctx = settings.create_db_context()?;
        let geocoder = Arc::new(NominatimGeocoder::new(
            &settings.geocoder_url,
            &settings.user_agent,
            settings.request_timeout(),
        )?);

        let cache = GeocodeCache::new(geocoder, ctx.cache());
        let pipeline = LookupPipeline::new(cache, ctx.districts(), ctx.officials());

        Ok(Self {
            pipeline: Arc::new(pipeline),
            status_repo: ctx.sync_status(),
        })
    }
}

/// Start the API server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings).await?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
