// Route resolver - snaps request coordinates onto the road network and
// computes shortest paths, network distances and round-trip totals
//
// Numan Thabit 2025 Nov

use crate::errors::RouteError;
use crate::network::{GeoPoint, NodeId, RoadNetwork, Snap};
use crate::router::routes::{NoRouteReason, ResolvedRoute, RouteOutcome, RouteRequest};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Resolver statistics for monitoring
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResolverStats {
    pub route_requests: u64,
    pub routes_found: u64,
    pub routes_missing: u64,
    pub distance_queries: u64,
    pub distance_fallbacks: u64,
    pub cache_hits: u64,
    pub cache_entries: usize,
    pub nodes: usize,
    pub edges: usize,
}

pub struct RouteResolver {
    network: Arc<RoadNetwork>,
    /// Maximum snapping distance in kilometres
    snap_tolerance_km: Option<f64>,
    /// Network distance per unordered node pair; reset when full
    distance_cache: RwLock<HashMap<(NodeId, NodeId), f64>>,
    cache_capacity: usize,
    route_requests: AtomicU64,
    routes_found: AtomicU64,
    routes_missing: AtomicU64,
    distance_queries: AtomicU64,
    distance_fallbacks: AtomicU64,
    cache_hits: AtomicU64,
}

impl RouteResolver {
    pub fn new(
        network: Arc<RoadNetwork>,
        snap_tolerance_km: Option<f64>,
        cache_capacity: usize,
    ) -> Self {
        Self {
            network,
            snap_tolerance_km,
            distance_cache: RwLock::new(HashMap::new()),
            cache_capacity,
            route_requests: AtomicU64::new(0),
            routes_found: AtomicU64::new(0),
            routes_missing: AtomicU64::new(0),
            distance_queries: AtomicU64::new(0),
            distance_fallbacks: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    pub fn network(&self) -> &Arc<RoadNetwork> {
        &self.network
    }

    /// Nearest node within the snap tolerance, if any
    pub fn snap(&self, point: &GeoPoint) -> Option<Snap> {
        snap_within(&self.network, point, self.snap_tolerance_km)
    }

    /// Shortest path between two arbitrary points, following network edges
    #[tracing::instrument(skip_all, fields(start = %req.start, end = %req.end))]
    pub async fn resolve(&self, req: &RouteRequest) -> Result<RouteOutcome, RouteError> {
        self.route_requests.fetch_add(1, Ordering::Relaxed);
        let req = *req;
        let outcome = self
            .on_network(move |network, tolerance| plan_route(network, tolerance, &req))
            .await?;
        match &outcome {
            RouteOutcome::Found(route) => {
                self.routes_found.fetch_add(1, Ordering::Relaxed);
                debug!(
                    points = route.points.len(),
                    distance_km = route.distance_km,
                    snap_start_km = route.start.distance_km,
                    snap_end_km = route.end.distance_km,
                    "route resolved"
                );
            }
            RouteOutcome::NoRoute(reason) => {
                self.routes_missing.fetch_add(1, Ordering::Relaxed);
                info!(reason = ?reason, "no route for request");
            }
        }
        Ok(outcome)
    }

    /// Network distance in km. Falls back to the straight-line distance when
    /// a point cannot be snapped or the snapped nodes are not connected.
    pub async fn road_distance(&self, start: &GeoPoint, end: &GeoPoint) -> Result<f64, RouteError> {
        self.distance_queries.fetch_add(1, Ordering::Relaxed);
        let (from, to) = (*start, *end);
        let snaps = self
            .on_network(move |network, tolerance| {
                (
                    snap_within(network, &from, tolerance),
                    snap_within(network, &to, tolerance),
                )
            })
            .await?;
        let (Some(a), Some(b)) = snaps else {
            self.distance_fallbacks.fetch_add(1, Ordering::Relaxed);
            return Ok(start.haversine_km(end));
        };
        if a.node == b.node {
            return Ok(0.0);
        }

        let key = pair_key(a.node, b.node);
        if let Some(d) = self.distance_cache.read().await.get(&key) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(*d);
        }

        let path = self
            .on_network(move |network, _| network.shortest_path(a.node, b.node))
            .await?;
        match path {
            Some(path) => {
                self.remember(key, path.distance_km).await;
                Ok(path.distance_km)
            }
            None => {
                self.distance_fallbacks.fetch_add(1, Ordering::Relaxed);
                Ok(start.haversine_km(end))
            }
        }
    }

    /// hub -> stops[0] -> ... -> stops[n-1] -> hub
    pub async fn round_trip_distance(
        &self,
        hub: &GeoPoint,
        stops: &[GeoPoint],
    ) -> Result<f64, RouteError> {
        let mut total = 0.0;
        for (from, to) in tour_legs(hub, stops) {
            total += self.road_distance(&from, &to).await?;
        }
        Ok(total)
    }

    /// Geometry of the same tour as `round_trip_distance`. Legs without a
    /// route contribute no points; a leg starting where the previous one
    /// ended does not repeat the shared point.
    pub async fn round_trip_path(
        &self,
        hub: &GeoPoint,
        stops: &[GeoPoint],
    ) -> Result<Vec<GeoPoint>, RouteError> {
        let legs = tour_legs(hub, stops);
        self.on_network(move |network, tolerance| {
            let mut points: Vec<GeoPoint> = Vec::new();
            for (from, to) in legs {
                let RouteOutcome::Found(route) =
                    plan_route(network, tolerance, &RouteRequest::new(from, to))
                else {
                    continue;
                };
                let skip = usize::from(points.last() == route.points.first());
                points.extend(route.points.into_iter().skip(skip));
            }
            points
        })
        .await
    }

    pub async fn stats(&self) -> ResolverStats {
        ResolverStats {
            route_requests: self.route_requests.load(Ordering::Relaxed),
            routes_found: self.routes_found.load(Ordering::Relaxed),
            routes_missing: self.routes_missing.load(Ordering::Relaxed),
            distance_queries: self.distance_queries.load(Ordering::Relaxed),
            distance_fallbacks: self.distance_fallbacks.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_entries: self.distance_cache.read().await.len(),
            nodes: self.network.node_count(),
            edges: self.network.edge_count(),
        }
    }

    /// Runs network work (snapping scans and searches) on the blocking pool
    async fn on_network<T, F>(&self, work: F) -> Result<T, RouteError>
    where
        T: Send + 'static,
        F: FnOnce(&RoadNetwork, Option<f64>) -> T + Send + 'static,
    {
        let network = Arc::clone(&self.network);
        let tolerance = self.snap_tolerance_km;
        tokio::task::spawn_blocking(move || work(&network, tolerance))
            .await
            .map_err(|e| RouteError::Search(e.to_string()))
    }

    async fn remember(&self, key: (NodeId, NodeId), distance_km: f64) {
        if self.cache_capacity == 0 {
            return;
        }
        let mut cache = self.distance_cache.write().await;
        if cache.len() >= self.cache_capacity && !cache.contains_key(&key) {
            debug!(entries = cache.len(), "distance cache full; resetting");
            cache.clear();
        }
        cache.insert(key, distance_km);
    }
}

fn snap_within(network: &RoadNetwork, point: &GeoPoint, tolerance_km: Option<f64>) -> Option<Snap> {
    network
        .nearest(point)
        .filter(|s| tolerance_km.map_or(true, |tol| s.distance_km <= tol))
}

fn plan_route(network: &RoadNetwork, tolerance_km: Option<f64>, req: &RouteRequest) -> RouteOutcome {
    if network.is_empty() {
        return RouteOutcome::NoRoute(NoRouteReason::EmptyNetwork);
    }
    let Some(start) = snap_within(network, &req.start, tolerance_km) else {
        return RouteOutcome::NoRoute(NoRouteReason::StartTooFar);
    };
    let Some(end) = snap_within(network, &req.end, tolerance_km) else {
        return RouteOutcome::NoRoute(NoRouteReason::EndTooFar);
    };
    let Some(path) = network.shortest_path(start.node, end.node) else {
        return RouteOutcome::NoRoute(NoRouteReason::Unreachable);
    };

    let points = path.nodes.iter().filter_map(|id| network.node(*id)).collect();
    RouteOutcome::Found(ResolvedRoute {
        points,
        distance_km: path.distance_km,
        start,
        end,
    })
}

// Distances are symmetric, so both directions share one entry
fn pair_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn tour_legs(hub: &GeoPoint, stops: &[GeoPoint]) -> Vec<(GeoPoint, GeoPoint)> {
    if stops.is_empty() {
        return Vec::new();
    }
    std::iter::once(*hub)
        .chain(stops.iter().copied())
        .chain(std::iter::once(*hub))
        .collect::<Vec<_>>()
        .windows(2)
        .map(|w| (w[0], w[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::graph::tests::fixture;

    fn resolver(tolerance_km: Option<f64>) -> RouteResolver {
        RouteResolver::new(
            Arc::new(RoadNetwork::from_geojson(&fixture())),
            tolerance_km,
            1_000,
        )
    }

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[tokio::test]
    async fn resolves_snapped_route_over_edges() {
        let r = resolver(None);
        let req = RouteRequest::new(pt(40.701, 29.899), pt(40.699, 30.002));
        let RouteOutcome::Found(route) = r.resolve(&req).await.unwrap() else {
            panic!("expected a route");
        };
        assert_eq!(
            route.points,
            vec![pt(40.70, 29.90), pt(40.70, 29.95), pt(40.70, 30.00)]
        );
        assert_eq!(route.start.point, pt(40.70, 29.90));
        assert_eq!(route.end.point, pt(40.70, 30.00));
        assert!(route.distance_km > 8.0 && route.distance_km < 9.0);

        let stats = r.stats().await;
        assert_eq!(stats.route_requests, 1);
        assert_eq!(stats.routes_found, 1);
    }

    #[tokio::test]
    async fn unreachable_and_empty_network_have_no_route() {
        let r = resolver(None);
        let req = RouteRequest::new(pt(40.70, 29.90), pt(41.00, 31.00));
        let outcome = r.resolve(&req).await.unwrap();
        assert_eq!(outcome, RouteOutcome::NoRoute(NoRouteReason::Unreachable));
        assert!(outcome.into_pairs().is_empty());

        let empty = RouteResolver::new(Arc::new(RoadNetwork::default()), None, 10);
        assert_eq!(
            empty.resolve(&req).await.unwrap(),
            RouteOutcome::NoRoute(NoRouteReason::EmptyNetwork)
        );
        assert_eq!(r.stats().await.routes_missing, 1);
    }

    #[tokio::test]
    async fn snap_tolerance_rejects_far_clicks() {
        let r = resolver(Some(0.5));
        let far = RouteRequest::new(pt(40.70, 29.90), pt(40.0, 29.0));
        assert_eq!(
            r.resolve(&far).await.unwrap(),
            RouteOutcome::NoRoute(NoRouteReason::EndTooFar)
        );
        let far_start = RouteRequest::new(pt(40.0, 29.0), pt(40.70, 29.90));
        assert_eq!(
            r.resolve(&far_start).await.unwrap(),
            RouteOutcome::NoRoute(NoRouteReason::StartTooFar)
        );
    }

    #[tokio::test]
    async fn same_snapped_node_gives_single_point() {
        let r = resolver(None);
        let req = RouteRequest::new(pt(40.7001, 29.9001), pt(40.6999, 29.8999));
        let pairs = r.resolve(&req).await.unwrap().into_pairs();
        assert_eq!(pairs, vec![[40.70, 29.90]]);
        assert_eq!(r.road_distance(&req.start, &req.end).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn road_distance_is_symmetric_and_cached() {
        let r = resolver(None);
        // no direct segment: the road goes around through a corner node
        let a = pt(40.60, 29.95);
        let b = pt(40.70, 29.95);
        let there = r.road_distance(&a, &b).await.unwrap();
        let back = r.road_distance(&b, &a).await.unwrap();
        assert_eq!(there, back);
        assert!(there > a.haversine_km(&b));

        let stats = r.stats().await;
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_entries, 1);
    }

    #[tokio::test]
    async fn road_distance_falls_back_to_straight_line() {
        let r = resolver(None);
        let a = pt(40.70, 29.90);
        let island = pt(41.00, 31.00);
        assert_eq!(
            r.road_distance(&a, &island).await.unwrap(),
            a.haversine_km(&island)
        );

        let empty = RouteResolver::new(Arc::new(RoadNetwork::default()), None, 10);
        assert_eq!(empty.road_distance(&a, &island).await.unwrap(), a.haversine_km(&island));
        assert_eq!(r.stats().await.distance_fallbacks, 1);
    }

    #[tokio::test]
    async fn round_trip_sums_every_leg() {
        let r = resolver(None);
        let hub = pt(40.70, 29.90);
        let stops = [pt(40.70, 29.95), pt(40.70, 30.00)];
        let total = r.round_trip_distance(&hub, &stops).await.unwrap();
        let leg1 = r.road_distance(&hub, &stops[0]).await.unwrap();
        let leg2 = r.road_distance(&stops[0], &stops[1]).await.unwrap();
        let leg3 = r.road_distance(&stops[1], &hub).await.unwrap();
        assert!((total - (leg1 + leg2 + leg3)).abs() < 1e-9);
        assert_eq!(r.round_trip_distance(&hub, &[]).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn cache_never_exceeds_its_capacity() {
        let net = Arc::new(RoadNetwork::from_geojson(&fixture()));
        let (a, b, c) = (pt(40.70, 29.90), pt(40.70, 29.95), pt(40.70, 30.00));

        let r = RouteResolver::new(Arc::clone(&net), None, 1);
        r.road_distance(&a, &b).await.unwrap();
        assert_eq!(r.stats().await.cache_entries, 1);
        r.road_distance(&b, &a).await.unwrap();
        assert_eq!(r.stats().await.cache_hits, 1);
        r.road_distance(&b, &c).await.unwrap();
        assert_eq!(r.stats().await.cache_entries, 1);

        let r = RouteResolver::new(net, None, 2);
        for (from, to) in [(a, b), (b, c), (a, c)] {
            r.road_distance(&from, &to).await.unwrap();
            assert!(r.stats().await.cache_entries <= 2);
        }
    }

    #[tokio::test]
    async fn round_trip_path_joins_legs() {
        let r = resolver(None);
        let hub = pt(40.70, 29.90);
        let far_end = pt(40.70, 30.00);
        let middle = pt(40.70, 29.95);

        let path = r.round_trip_path(&hub, &[far_end]).await.unwrap();
        assert_eq!(path, vec![hub, middle, far_end, middle, hub]);

        // legs to the island have no route and add nothing
        let island = pt(41.00, 31.00);
        assert!(r.round_trip_path(&hub, &[island]).await.unwrap().is_empty());
        assert!(r.round_trip_path(&hub, &[]).await.unwrap().is_empty());
        assert_eq!(r.stats().await.route_requests, 0);
    }
}
