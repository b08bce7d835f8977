// Router HTTP API implementation
// This file provides HTTP endpoints for route resolution, network
// distances and service statistics
//
// Numan Thabit 2025 Nov

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use super::resolver::{ResolverStats, RouteResolver};
use super::routes::RouteRequest;
use crate::control::AdmissionControl;
use crate::errors::RouteError;
use crate::metrics;
use crate::network::GeoPoint;

/// Shared state behind every handler
#[derive(Clone)]
pub struct ApiState {
    pub resolver: Arc<RouteResolver>,
    pub admission: AdmissionControl,
    /// GeoJSON document served as-is at /export.geojson
    pub network_path: PathBuf,
}

impl ApiState {
    pub fn new(
        resolver: Arc<RouteResolver>,
        admission: AdmissionControl,
        network_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            admission,
            network_path: network_path.into(),
        }
    }
}

/// Endpoint query: `?startLat=..&startLon=..&endLat=..&endLon=..`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairQuery {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
}

impl PairQuery {
    fn into_request(self) -> Result<RouteRequest, RouteError> {
        Ok(RouteRequest::new(
            GeoPoint::new(self.start_lat, self.start_lon)?,
            GeoPoint::new(self.end_lat, self.end_lon)?,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct RoundTripRequest {
    pub hub: [f64; 2],
    #[serde(default)]
    pub stops: Vec<[f64; 2]>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub distance_km: f64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub resolver: ResolverStats,
    pub inflight: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn reject(endpoint: &str, err: RouteError) -> ApiError {
    let status = match err {
        RouteError::InvalidCoordinate(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let outcome = if status == StatusCode::BAD_REQUEST {
        "rejected"
    } else {
        "error"
    };
    metrics::ROUTE_REQUESTS
        .with_label_values(&[endpoint, outcome])
        .inc();
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Create the HTTP router with API endpoints
pub fn create_api_router(state: ApiState) -> AxumRouter {
    let network_file = ServeFile::new(&state.network_path);
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/api/route", get(get_route))
        .route("/api/distance", get(get_distance))
        .route("/api/round-trip", post(round_trip))
        .route("/api/round-trip/path", post(round_trip_path))
        .route("/api/stats", get(get_stats))
        .route("/metrics", get(get_metrics))
        .route_service("/export.geojson", network_file)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Route endpoint - `[lat, lon]` pairs along the network, `[]` when there is no route
async fn get_route(
    State(state): State<ApiState>,
    Query(query): Query<PairQuery>,
) -> Result<Json<Vec<[f64; 2]>>, ApiError> {
    let _timer = metrics::ROUTE_LATENCY
        .with_label_values(&["route"])
        .start_timer();
    let req = query.into_request().map_err(|e| reject("route", e))?;

    let _permit = state.admission.acquire().await;
    let outcome = state
        .resolver
        .resolve(&req)
        .await
        .map_err(|e| reject("route", e))?;

    metrics::ROUTE_REQUESTS
        .with_label_values(&["route", outcome.label()])
        .inc();
    Ok(Json(outcome.into_pairs()))
}

/// Network distance between two points in km
async fn get_distance(
    State(state): State<ApiState>,
    Query(query): Query<PairQuery>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let _timer = metrics::ROUTE_LATENCY
        .with_label_values(&["distance"])
        .start_timer();
    let req = query.into_request().map_err(|e| reject("distance", e))?;

    let _permit = state.admission.acquire().await;
    let distance_km = state
        .resolver
        .road_distance(&req.start, &req.end)
        .await
        .map_err(|e| reject("distance", e))?;

    metrics::ROUTE_REQUESTS
        .with_label_values(&["distance", "ok"])
        .inc();
    Ok(Json(DistanceResponse { distance_km }))
}

impl RoundTripRequest {
    fn into_points(self) -> Result<(GeoPoint, Vec<GeoPoint>), RouteError> {
        let hub = GeoPoint::from_pair(self.hub)?;
        let stops = self
            .stops
            .into_iter()
            .map(GeoPoint::from_pair)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((hub, stops))
    }
}

/// Closed tour from the hub through every stop and back
async fn round_trip(
    State(state): State<ApiState>,
    Json(req): Json<RoundTripRequest>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let _timer = metrics::ROUTE_LATENCY
        .with_label_values(&["round_trip"])
        .start_timer();
    let (hub, stops) = req.into_points().map_err(|e| reject("round_trip", e))?;

    let _permit = state.admission.acquire().await;
    let distance_km = state
        .resolver
        .round_trip_distance(&hub, &stops)
        .await
        .map_err(|e| reject("round_trip", e))?;

    metrics::ROUTE_REQUESTS
        .with_label_values(&["round_trip", "ok"])
        .inc();
    Ok(Json(DistanceResponse { distance_km }))
}

/// `[lat, lon]` pairs along the same tour as /api/round-trip
async fn round_trip_path(
    State(state): State<ApiState>,
    Json(req): Json<RoundTripRequest>,
) -> Result<Json<Vec<[f64; 2]>>, ApiError> {
    let _timer = metrics::ROUTE_LATENCY
        .with_label_values(&["round_trip_path"])
        .start_timer();
    let (hub, stops) = req.into_points().map_err(|e| reject("round_trip_path", e))?;

    let _permit = state.admission.acquire().await;
    let points = state
        .resolver
        .round_trip_path(&hub, &stops)
        .await
        .map_err(|e| reject("round_trip_path", e))?;

    metrics::ROUTE_REQUESTS
        .with_label_values(&["round_trip_path", "ok"])
        .inc();
    Ok(Json(points.into_iter().map(GeoPoint::to_pair).collect()))
}

/// Resolver statistics
async fn get_stats(State(state): State<ApiState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        resolver: state.resolver.stats().await,
        inflight: state.admission.inflight(),
    })
}

async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
