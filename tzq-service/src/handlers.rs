//! HTTP request handlers for the timezone service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tzq::geojson::timezones_for_geometry;
use tzq::TzError;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Query parameters for the timezone endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct TimezoneQuery {
    /// Latitude in decimal degrees (-90 to 90).
    pub lat: f64,
    /// Longitude in decimal degrees (-180 to 180).
    pub lon: f64,
}

/// Timezones at a single coordinate.
#[derive(Debug, Serialize, ToSchema)]
pub struct TimezoneResponse {
    /// Latitude queried.
    pub lat: f64,
    /// Longitude queried.
    pub lon: f64,
    /// IANA timezone ids, never empty.
    #[schema(example = json!(["Asia/Tokyo"]))]
    pub timezones: Vec<String>,
}

/// A GeoJSON geometry whose positions are looked up.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct GeometryRequest(pub geojson::Geometry);

/// Timezones at one position of a geometry.
#[derive(Debug, Serialize, ToSchema)]
pub struct PointResult {
    pub lat: f64,
    pub lon: f64,
    pub timezones: Vec<String>,
}

/// Timezones for every position of a geometry, in document order.
#[derive(Debug, Serialize, ToSchema)]
pub struct GeometryResponse {
    pub results: Vec<PointResult>,
}

/// Query parameters for the offset endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct OffsetQuery {
    /// IANA timezone id.
    pub tzid: String,
}

/// Current UTC offset of a timezone.
#[derive(Debug, Serialize, ToSchema)]
pub struct OffsetResponse {
    pub tzid: String,
    /// Minutes east of UTC.
    pub offset_minutes: i32,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Lookup statistics since startup.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub lookups: u64,
    pub north_pole: u64,
    pub id_list_hits: u64,
    pub geometry_hits: u64,
    pub ocean_fallbacks: u64,
    pub geometry_fetches: u64,
}

/// HTTP status for a lookup failure.
pub fn status_for(error: &TzError) -> StatusCode {
    match error {
        TzError::InvalidCoordinate { .. }
        | TzError::InvalidGeometry { .. }
        | TzError::UnknownTimezone { .. } => StatusCode::BAD_REQUEST,
        TzError::Transport(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: TzError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, "Timezone query failed");
    } else {
        tracing::warn!(error = %error, "Rejected timezone query");
    }

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

/// Get the timezones at a coordinate.
#[utoipa::path(
    get,
    path = "/timezone",
    tag = "timezone",
    params(TimezoneQuery),
    responses(
        (status = 200, description = "Timezones found", body = TimezoneResponse),
        (status = 400, description = "Invalid coordinate", body = ErrorResponse),
        (status = 502, description = "Data source unavailable", body = ErrorResponse),
        (status = 500, description = "Corrupt timezone data", body = ErrorResponse)
    )
)]
#[axum::debug_handler]
pub async fn get_timezone(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimezoneQuery>,
) -> Response {
    tracing::debug!(lat = query.lat, lon = query.lon, "Timezone query");

    match state.finder.find(query.lat, query.lon).await {
        Ok(timezones) => {
            tracing::info!(
                lat = query.lat,
                lon = query.lon,
                timezones = ?timezones,
                "Timezone found"
            );
            Json(TimezoneResponse {
                lat: query.lat,
                lon: query.lon,
                timezones,
            })
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Get the timezones at every position of a GeoJSON geometry.
#[utoipa::path(
    post,
    path = "/timezone",
    tag = "timezone",
    request_body(content = GeometryRequest, description = "GeoJSON geometry", content_type = "application/json"),
    responses(
        (status = 200, description = "Timezones for each position", body = GeometryResponse),
        (status = 400, description = "Invalid geometry or coordinate", body = ErrorResponse),
        (status = 502, description = "Data source unavailable", body = ErrorResponse)
    )
)]
pub async fn post_timezone(
    State(state): State<Arc<AppState>>,
    Json(GeometryRequest(geometry)): Json<GeometryRequest>,
) -> Response {
    match timezones_for_geometry(&state.finder, &geometry).await {
        Ok(points) => {
            tracing::info!(positions = points.len(), "Geometry timezones found");
            let results = points
                .into_iter()
                .map(|p| PointResult {
                    lat: p.lat,
                    lon: p.lon,
                    timezones: p.timezones,
                })
                .collect();
            Json(GeometryResponse { results }).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Get the current UTC offset of a timezone.
#[utoipa::path(
    get,
    path = "/offset",
    tag = "timezone",
    params(OffsetQuery),
    responses(
        (status = 200, description = "Current offset", body = OffsetResponse),
        (status = 400, description = "Unknown timezone", body = ErrorResponse)
    )
)]
pub async fn get_offset(Query(query): Query<OffsetQuery>) -> Response {
    match tzq::to_offset(&query.tzid) {
        Ok(offset_minutes) => Json(OffsetResponse {
            tzid: query.tzid,
            offset_minutes,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get lookup statistics.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses((status = 200, description = "Lookup counters", body = StatsResponse))
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.finder.stats();

    Json(StatsResponse {
        lookups: stats.lookups,
        north_pole: stats.north_pole,
        id_list_hits: stats.id_list_hits,
        geometry_hits: stats.geometry_hits,
        ocean_fallbacks: stats.ocean_fallbacks,
        geometry_fetches: stats.geometry_fetches,
    })
}
