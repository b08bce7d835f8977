// Shortest path search
// A* over the haversine-weighted road graph. The straight-line distance to
// the target never overestimates a road distance, so the first settled
// path to the target is the shortest one.
//
// Numan Thabit 2025 Nov

use crate::network::graph::{NodeId, RoadNetwork};
use petgraph::algo::astar;
use petgraph::visit::EdgeRef;

/// A path through the network
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub nodes: Vec<NodeId>,
    pub distance_km: f64,
}

impl RoadNetwork {
    /// Shortest path by distance. `None` when either id is unknown or the
    /// target is unreachable.
    pub fn shortest_path(&self, start: NodeId, end: NodeId) -> Option<PathResult> {
        let target = self.node(end)?;
        self.node(start)?;

        let (distance_km, nodes) = astar(
            &self.graph,
            start,
            |node| node == end,
            |edge| *edge.weight(),
            |node| self.graph[node].haversine_km(&target),
        )?;
        Some(PathResult { nodes, distance_km })
    }
}
