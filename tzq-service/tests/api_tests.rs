//! Integration tests for the HTTP API.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tzq::TzFinderBuilder;
use tzq_service::{app, AppState};

/// Index whose leaves are all id lists or empty:
///
/// - north-east quadrant: `Asia/Tokyo`
/// - north-west / south-west: `America/Chicago`, `America/Winnipeg`
/// - everything else: ocean
const INDEX: &str = r#"{
    "lookup": {
        "a": [0],
        "b": {"c": [1, 2]}
    },
    "timezones": ["Asia/Tokyo", "America/Chicago", "America/Winnipeg"]
}"#;

/// Write the data files and return a server over them.
fn create_test_server(temp_dir: &TempDir, index: &str) -> TestServer {
    let index_path = temp_dir.path().join("timezones.json");
    let geo_path = temp_dir.path().join("timezones.geo.dat");
    std::fs::write(&index_path, index).unwrap();
    std::fs::write(&geo_path, b"unused geometry store").unwrap();

    server_for(
        index_path.to_str().unwrap(),
        geo_path.to_str().unwrap(),
    )
}

fn server_for(index: &str, geometry: &str) -> TestServer {
    let finder = TzFinderBuilder::new(index, geometry).build().unwrap();
    let state = Arc::new(AppState { finder });
    TestServer::new(app(state)).unwrap()
}

#[tokio::test]
async fn test_timezone_endpoint_id_list() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let response = server.get("/timezone?lat=35.68&lon=139.69").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["timezones"], json!(["Asia/Tokyo"]));
    assert_eq!(json["lat"], 35.68);
    assert_eq!(json["lon"], 139.69);
}

#[tokio::test]
async fn test_timezone_endpoint_multiple_ids() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let response = server.get("/timezone?lat=40&lon=-100").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(
        json["timezones"],
        json!(["America/Chicago", "America/Winnipeg"])
    );
}

#[tokio::test]
async fn test_timezone_endpoint_ocean() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let response = server.get("/timezone?lat=-30&lon=-100").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["timezones"], json!(["Etc/GMT+7"]));

    // On a band edge both neighbours apply
    let response = server.get("/timezone?lat=-30&lon=-97.5").await;
    let json: Value = response.json();
    assert_eq!(json["timezones"], json!(["Etc/GMT+6", "Etc/GMT+7"]));
}

#[tokio::test]
async fn test_timezone_endpoint_north_pole() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let response = server.get("/timezone?lat=90&lon=45").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["timezones"].as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_timezone_endpoint_invalid_coordinates() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let response = server.get("/timezone?lat=91.0&lon=0.0").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let json: Value = response.json();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Invalid coordinate"));
}

#[tokio::test]
async fn test_timezone_endpoint_missing_params() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let response = server.get("/timezone?lon=138.5").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/timezone?lat=35.5").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/timezone").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_index_is_bad_gateway() {
    let temp_dir = TempDir::new().unwrap();
    let geo_path = temp_dir.path().join("timezones.geo.dat");
    std::fs::write(&geo_path, b"unused").unwrap();
    let missing = temp_dir.path().join("missing.json");

    let server = server_for(missing.to_str().unwrap(), geo_path.to_str().unwrap());

    let response = server.get("/timezone?lat=10&lon=10").await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    // Invalid input is still rejected before any fetch
    let response = server.get("/timezone?lat=-91&lon=10").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_index_is_server_error() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(
        &temp_dir,
        r#"{"lookup": {"a": [5]}, "timezones": ["Asia/Tokyo"]}"#,
    );

    let response = server.get("/timezone?lat=10&lon=10").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("Malformed index"));
}

#[tokio::test]
async fn test_geometry_point() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let geometry = json!({"type": "Point", "coordinates": [139.69, 35.68]});
    let response = server.post("/timezone").json(&geometry).await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(
        json["results"],
        json!([{"lat": 35.68, "lon": 139.69, "timezones": ["Asia/Tokyo"]}])
    );
}

#[tokio::test]
async fn test_geometry_linestring() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let geometry = json!({
        "type": "LineString",
        "coordinates": [[139.69, 35.68], [-100.0, 40.0], [-100.0, -30.0]]
    });
    let response = server.post("/timezone").json(&geometry).await;

    response.assert_status_ok();
    let json: Value = response.json();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["timezones"], json!(["Asia/Tokyo"]));
    assert_eq!(
        results[1]["timezones"],
        json!(["America/Chicago", "America/Winnipeg"])
    );
    assert_eq!(results[2]["timezones"], json!(["Etc/GMT+7"]));
}

#[tokio::test]
async fn test_geometry_invalid_position() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let geometry = json!({"type": "MultiPoint", "coordinates": [[10.0, 10.0], [10.0, 95.0]]});
    let response = server.post("/timezone").json(&geometry).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_offset_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let response = server.get("/offset?tzid=Asia/Tokyo").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["tzid"], "Asia/Tokyo");
    assert_eq!(json["offset_minutes"], 540);

    let response = server.get("/offset?tzid=Etc/GMT%2B7").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["offset_minutes"], -420);

    let response = server.get("/offset?tzid=Mars/Olympus_Mons").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn test_stats_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let response = server.get("/stats").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["lookups"], 0);

    server.get("/timezone?lat=35.68&lon=139.69").await;
    server.get("/timezone?lat=-30&lon=-100").await;
    server.get("/timezone?lat=90&lon=0").await;

    let response = server.get("/stats").await;
    let json: Value = response.json();
    assert_eq!(json["lookups"], 3);
    assert_eq!(json["id_list_hits"], 1);
    assert_eq!(json["ocean_fallbacks"], 1);
    assert_eq!(json["north_pole"], 1);
    assert_eq!(json["geometry_fetches"], 0);
}

#[tokio::test]
async fn test_openapi_document() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir, INDEX);

    let response = server.get("/api-docs/openapi.json").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert!(json["paths"]["/timezone"]["get"].is_object());
    assert!(json["paths"]["/timezone"]["post"].is_object());
    assert!(json["paths"]["/offset"]["get"].is_object());
}
