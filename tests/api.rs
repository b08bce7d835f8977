use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use route_resolver::control::AdmissionControl;
use route_resolver::network::RoadNetwork;
use route_resolver::router::{create_api_router, ApiState, RouteResolver};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

fn network_document() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {"type":"Feature","properties":{"name":"coast road"},
             "geometry":{"type":"LineString","coordinates":[[29.90,40.70],[29.95,40.75],[30.00,40.80]]}},
            {"type":"Feature","geometry":{"type":"LineString","coordinates":[[31.00,41.00],[31.01,41.00]]}}
        ]
    })
}

async fn app(tolerance_km: Option<f64>) -> (Router, NamedTempFile) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(network_document().to_string().as_bytes())
        .unwrap();
    let network = RoadNetwork::load(file.path()).await.unwrap();
    let resolver = Arc::new(RouteResolver::new(Arc::new(network), tolerance_km, 1_000));
    let state = ApiState::new(resolver, AdmissionControl::new(4, Some(1_000)), file.path());
    (create_api_router(state), file)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn health_is_ok() {
    let (router, _file) = app(None).await;
    let (status, _) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn route_returns_lat_lon_pairs_along_the_network() {
    let (router, _file) = app(None).await;
    let (status, body) = get(
        &router,
        "/api/route?startLat=40.70&startLon=29.90&endLat=40.80&endLon=30.00",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!([[40.70, 29.90], [40.75, 29.95], [40.80, 30.00]]));
}

#[tokio::test]
async fn clicks_off_the_road_are_snapped() {
    let (router, _file) = app(None).await;
    let (status, body) = get(
        &router,
        "/api/route?startLat=40.801&startLon=30.002&endLat=40.749&endLon=29.951",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!([[40.80, 30.00], [40.75, 29.95]]));
}

#[tokio::test]
async fn unreachable_or_too_far_gives_empty_array() {
    let (router, _file) = app(Some(0.5)).await;
    let (status, body) = get(
        &router,
        "/api/route?startLat=40.70&startLon=29.90&endLat=41.00&endLon=31.00",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));

    let (status, body) = get(
        &router,
        "/api/route?startLat=40.70&startLon=29.90&endLat=10.0&endLon=10.0",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));
}

#[tokio::test]
async fn bad_coordinates_are_rejected() {
    let (router, _file) = app(None).await;

    let (status, body) = get(
        &router,
        "/api/route?startLat=95&startLon=29.90&endLat=40.80&endLon=30.00",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("latitude"));

    let (status, _) = get(&router, "/api/route?startLat=40.7&startLon=29.9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(
        &router,
        "/api/route?startLat=abc&startLon=29.90&endLat=40.80&endLon=30.00",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn distance_and_round_trip() {
    let (router, _file) = app(None).await;

    let (status, body) = get(
        &router,
        "/api/distance?startLat=40.70&startLon=29.90&endLat=40.80&endLon=30.00",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let one_way = serde_json::from_slice::<Value>(&body).unwrap()["distance_km"]
        .as_f64()
        .unwrap();
    assert!(one_way > 13.0 && one_way < 15.0, "got {one_way}");

    let (status, body) = post_json(
        &router,
        "/api/round-trip",
        json!({ "hub": [40.70, 29.90], "stops": [[40.80, 30.00]] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let round_trip = serde_json::from_slice::<Value>(&body).unwrap()["distance_km"]
        .as_f64()
        .unwrap();
    assert!((round_trip - 2.0 * one_way).abs() < 1e-9);

    let (status, body) = get(&router, "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    let stats: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats["resolver"]["distance_queries"], 3);
    assert_eq!(stats["resolver"]["nodes"], 5);
    assert_eq!(stats["inflight"], 0);
}

#[tokio::test]
async fn round_trip_path_follows_the_tour() {
    let (router, _file) = app(None).await;

    let (status, body) = post_json(
        &router,
        "/api/round-trip/path",
        json!({ "hub": [40.70, 29.90], "stops": [[40.80, 30.00]] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!([[40.70, 29.90], [40.75, 29.95], [40.80, 30.00], [40.75, 29.95], [40.70, 29.90]])
    );

    let (status, _) = post_json(
        &router,
        "/api/round-trip/path",
        json!({ "hub": [140.0, 29.90], "stops": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn serves_the_network_document_and_metrics() {
    let (router, _file) = app(None).await;

    let (status, body) = get(&router, "/export.geojson").await;
    assert_eq!(status, StatusCode::OK);
    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(doc, network_document());

    get(
        &router,
        "/api/route?startLat=40.70&startLon=29.90&endLat=40.80&endLon=30.00",
    )
    .await;
    let (status, body) = get(&router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("resolver_requests_total"));
}
