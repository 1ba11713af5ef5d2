//! Request handlers for the API server.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::lookup::LookupError;

use super::AppState;

/// API error carrying the HTTP status and a message for the JSON body.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        let status = match &err {
            LookupError::AddressNotFound
            | LookupError::NoDistrictsFound
            | LookupError::OfficialNotFound(_) => StatusCode::NOT_FOUND,
            LookupError::GeocodeTimeout => StatusCode::REQUEST_TIMEOUT,
            LookupError::GeocodeFailed(_) => StatusCode::BAD_GATEWAY,
            LookupError::TooManyAddresses { .. } => StatusCode::BAD_REQUEST,
            LookupError::Db(e) => {
                error!(error = %e, "database error serving request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<crate::repository::DieselError> for ApiError {
    fn from(err: crate::repository::DieselError) -> Self {
        error!(error = %err, "database error serving request");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("database error: {}", err),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub address: String,
}

/// GET /api/v1/lookup?address=...
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.pipeline.lookup(&query.address).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct BulkLookupRequest {
    pub addresses: Vec<String>,
}

/// POST /api/v1/bulk-lookup with `{"addresses": [...]}`.
pub async fn bulk_lookup(
    State(state): State<AppState>,
    Json(request): Json<BulkLookupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.pipeline.bulk_lookup(&request.addresses).await?;
    Ok(Json(json!({ "results": items })))
}

#[derive(Debug, Deserialize)]
pub struct DistrictsQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// GET /api/v1/districts as a GeoJSON FeatureCollection.
///
/// With `lat` and `lng` only the districts containing the point are
/// returned, 404 when none do; without them, every district. Supplying
/// just one of the two is a 400.
pub async fn list_districts(
    State(state): State<AppState>,
    Query(query): Query<DistrictsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let districts = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => {
            state
                .pipeline
                .districts_at(&crate::models::GeoPoint::new(lat, lng))
                .await?
        }
        (None, None) => state.pipeline.all_districts().await?,
        _ => {
            return Err(ApiError {
                status: StatusCode::BAD_REQUEST,
                message: "both lat and lng are required to filter by point".to_string(),
            })
        }
    };

    let features: Vec<serde_json::Value> = districts
        .iter()
        .map(|district| {
            json!({
                "type": "Feature",
                "properties": {
                    "id": district.id,
                    "district_type": district.district_type,
                    "state_fips": district.state_fips,
                    "district_code": district.district_code,
                    "name": district.name,
                },
                "geometry": district.boundary,
            })
        })
        .collect();

    Ok(Json(json!({
        "type": "FeatureCollection",
        "features": features,
    })))
}

/// GET /api/v1/officials/:official_id
pub async fn official_detail(
    State(state): State<AppState>,
    Path(official_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.pipeline.official_detail(&official_id).await?;
    Ok(Json(detail))
}

/// GET /api/v1/sync/status
pub async fn sync_status(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let statuses = state.status_repo.get_all().await?;
    Ok(Json(statuses))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
