// Road network module
// GeoJSON parsing, graph construction, snapping and path search
//
// Numan Thabit 2025 Nov

pub mod geojson;
pub mod graph;
pub mod point;
pub mod search;

pub use geojson::FeatureCollection;
pub use graph::{NodeId, RoadNetwork, Snap};
pub use point::GeoPoint;
pub use search::PathResult;
