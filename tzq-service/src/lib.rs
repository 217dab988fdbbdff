//! tzq service library
//!
//! HTTP handlers, router and OpenAPI document for the timezone service.
//! This library is used by both the tzq-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tzq::LocationFinder;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Finder answering timezone queries.
    pub finder: LocationFinder,
}

/// OpenAPI documentation for the tzq service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "tzq Timezone Service",
        version = "0.1.0",
        description = "REST API resolving coordinates to IANA timezone ids.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::get_timezone,
        handlers::post_timezone,
        handlers::get_offset,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::TimezoneResponse,
            handlers::GeometryRequest,
            handlers::GeometryResponse,
            handlers::PointResult,
            handlers::OffsetResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "timezone", description = "Timezone lookup endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the router with every endpoint, Swagger UI and middleware.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/timezone",
            get(handlers::get_timezone).post(handlers::post_timezone),
        )
        .route("/offset", get(handlers::get_offset))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    ErrorResponse, GeometryResponse, HealthResponse, OffsetQuery, OffsetResponse, PointResult,
    StatsResponse, TimezoneQuery, TimezoneResponse,
};
