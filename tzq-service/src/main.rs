//! tzq service - HTTP microservice for timezone lookups.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TZQ_TZ_DATA` | Index document path or URL | Required |
//! | `TZQ_GEO_DATA` | Geometry store path or URL | Required |
//! | `TZQ_TIMEOUT_SECS` | HTTP request timeout | 30 |
//! | `TZQ_MAX_RETRIES` | Retries for transient HTTP failures | 2 |
//! | `TZQ_PORT` | HTTP server port | 8080 |
//! | `TZQ_PRELOAD` | Fetch the index before accepting requests | false |
//! | `RUST_LOG` | Log filter (e.g., "info", "debug") | see below |
//!
//! ## Endpoints
//!
//! - `GET /timezone?lat=X&lon=Y` - Timezones at a coordinate
//! - `POST /timezone` - Timezones for every position of a GeoJSON geometry
//! - `GET /offset?tzid=Z` - Current UTC offset of a timezone
//! - `GET /health` - Health check
//! - `GET /stats` - Lookup statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tzq::TzFinderBuilder;
use tzq_service::{app, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tzq_service=info,tzq=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("TZQ_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // TZQ_TZ_DATA, TZQ_GEO_DATA, TZQ_TIMEOUT_SECS and TZQ_MAX_RETRIES are
    // read by the library
    let builder = TzFinderBuilder::from_env()?;
    tracing::info!(
        index = builder.index_location(),
        geometry = builder.geometry_location(),
        port = port,
        "Starting tzq service"
    );
    let finder = builder.build()?;

    if preload_enabled(std::env::var("TZQ_PRELOAD").ok().as_deref()) {
        tracing::info!("Preloading timezone index");
        let index = finder.index().await?;
        let stats = index.stats();
        tracing::info!(
            timezones = stats.timezones,
            max_depth = stats.max_depth,
            geometry_leaves = stats.geometry_leaves,
            "Preload complete"
        );
    }

    let state = Arc::new(AppState { finder });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Whether `TZQ_PRELOAD` asks for the index to be fetched at startup.
fn preload_enabled(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("true" | "1" | "yes")
    )
}
