// Route types
// Requests, resolved routes and the reasons a pair can have no route
//
// Numan Thabit 2025 Nov

use crate::network::{GeoPoint, Snap};
use serde::{Deserialize, Serialize};

/// An ordered (start, end) pair, consumed once
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: GeoPoint,
    pub end: GeoPoint,
}

impl RouteRequest {
    pub fn new(start: GeoPoint, end: GeoPoint) -> Self {
        Self { start, end }
    }
}

/// A route found over the network
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute {
    /// Node coordinates from the snapped start to the snapped end
    pub points: Vec<GeoPoint>,
    pub distance_km: f64,
    pub start: Snap,
    pub end: Snap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoRouteReason {
    EmptyNetwork,
    StartTooFar,
    EndTooFar,
    Unreachable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Found(ResolvedRoute),
    NoRoute(NoRouteReason),
}

impl RouteOutcome {
    /// Wire form: `[lat, lon]` pairs, empty when there is no route
    pub fn into_pairs(self) -> Vec<[f64; 2]> {
        match self {
            RouteOutcome::Found(route) => route.points.into_iter().map(GeoPoint::to_pair).collect(),
            RouteOutcome::NoRoute(_) => Vec::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RouteOutcome::Found(_) => "found",
            RouteOutcome::NoRoute(NoRouteReason::EmptyNetwork) => "empty_network",
            RouteOutcome::NoRoute(NoRouteReason::StartTooFar) => "start_too_far",
            RouteOutcome::NoRoute(NoRouteReason::EndTooFar) => "end_too_far",
            RouteOutcome::NoRoute(NoRouteReason::Unreachable) => "unreachable",
        }
    }
}
