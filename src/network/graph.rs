// Road graph
// Builds an undirected, haversine-weighted graph from GeoJSON lines and
// answers nearest-node queries used for snapping
//
// Numan Thabit 2025 Nov

use crate::errors::RouteError;
use crate::network::geojson::{FeatureCollection, Position};
use crate::network::point::GeoPoint;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

pub type NodeId = NodeIndex;

/// Coordinates closer than this (in degrees) collapse into one node
const DEDUP_SCALE: f64 = 1e6;

/// Result of snapping a coordinate onto the network
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub node: NodeId,
    pub point: GeoPoint,
    pub distance_km: f64,
}

/// Immutable road network. Node weights are coordinates, edge weights are
/// segment lengths in kilometres.
#[derive(Debug, Default)]
pub struct RoadNetwork {
    pub(crate) graph: UnGraph<GeoPoint, f64>,
}

impl RoadNetwork {
    /// Read and parse a GeoJSON file into a graph
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RouteError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RouteError::NetworkIo(format!("{}: {e}", path.display())))?;
        let collection = FeatureCollection::from_slice(&bytes)?;
        let network = Self::from_geojson(&collection);
        info!(
            path = %path.display(),
            features = collection.features.len(),
            nodes = network.node_count(),
            edges = network.edge_count(),
            "road network loaded"
        );
        Ok(network)
    }

    /// Like `load`, but an unreadable file yields the sample network when
    /// `fallback` is set. A file that reads but does not parse is still an error.
    pub async fn load_or_sample(path: impl AsRef<Path>, fallback: bool) -> Result<Self, RouteError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Err(err @ RouteError::NetworkIo(_)) if fallback => {
                warn!(
                    error = %err,
                    path = %path.display(),
                    "road network unavailable; using sample network"
                );
                Ok(Self::sample())
            }
            other => other,
        }
    }

    pub fn from_geojson(collection: &FeatureCollection) -> Self {
        let mut builder = NetworkBuilder::default();
        for line in collection.road_lines() {
            builder.add_line(&line);
        }
        builder.build()
    }

    /// Two-node stand-in used when no network file is available
    pub fn sample() -> Self {
        let mut builder = NetworkBuilder::default();
        let a = builder.intern(GeoPoint { lat: 40.8222, lon: 29.9215 });
        let b = builder.intern(GeoPoint { lat: 40.7654, lon: 29.9408 });
        builder.connect(a, b, 8.5);
        builder.build()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Road segment count
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<GeoPoint> {
        self.graph.node_weight(id).copied()
    }

    /// Adjacent nodes with the length of the connecting segment
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.graph.edges(id).map(move |e| {
            let other = if e.source() == id { e.target() } else { e.source() };
            (other, *e.weight())
        })
    }

    /// Nearest node by great-circle distance. Linear scan; ties keep the lowest id.
    pub fn nearest(&self, point: &GeoPoint) -> Option<Snap> {
        let mut best: Option<Snap> = None;
        for node in self.graph.node_indices() {
            let candidate = self.graph[node];
            let distance_km = point.haversine_km(&candidate);
            if best.map_or(true, |b| distance_km < b.distance_km) {
                best = Some(Snap {
                    node,
                    point: candidate,
                    distance_km,
                });
            }
        }
        best
    }
}

#[derive(Default)]
struct NetworkBuilder {
    graph: UnGraph<GeoPoint, f64>,
    index: HashMap<(i64, i64), NodeId>,
}

impl NetworkBuilder {
    fn intern(&mut self, point: GeoPoint) -> NodeId {
        let key = (
            (point.lat * DEDUP_SCALE).round() as i64,
            (point.lon * DEDUP_SCALE).round() as i64,
        );
        *self
            .index
            .entry(key)
            .or_insert_with(|| self.graph.add_node(point))
    }

    fn connect(&mut self, a: NodeId, b: NodeId, weight_km: f64) {
        self.graph.add_edge(a, b, weight_km);
    }

    fn add_line(&mut self, line: &[Option<Position>]) {
        let mut prev: Option<NodeId> = None;
        for position in line {
            let current = (*position)
                .and_then(|[lon, lat]| GeoPoint::new(lat, lon).ok())
                .map(|p| self.intern(p));
            let Some(current) = current else {
                debug!(position = ?position, "skipping unusable position");
                prev = None;
                continue;
            };
            if let Some(prev) = prev.filter(|p| *p != current) {
                let weight = self.graph[prev].haversine_km(&self.graph[current]);
                self.connect(prev, current, weight);
            }
            prev = Some(current);
        }
    }

    fn build(self) -> RoadNetwork {
        RoadNetwork { graph: self.graph }
    }
}
