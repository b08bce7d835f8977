// GeoJSON document model
// Minimal FeatureCollection types and extraction of line geometry
// that contributes road segments
//
// Numan Thabit 2025 Nov

use crate::errors::RouteError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// A GeoJSON FeatureCollection reduced to what the graph builder reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    #[serde(deserialize_with = "skip_malformed")]
    pub features: Vec<Feature>,
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

/// Geometry kept loosely typed: the type name is matched case-insensitively
/// and coordinates are decoded on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

// Features that do not decode are dropped one by one; the rest of the
// document still loads.
fn skip_malformed<'de, D>(deserializer: D) -> Result<Vec<Feature>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(feature) => Some(feature),
            Err(err) => {
                debug!(index, error = %err, "skipping malformed feature");
                None
            }
        })
        .collect())
}

/// A position as `[lon, lat]`
pub type Position = [f64; 2];

impl FeatureCollection {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RouteError> {
        let root: Value = serde_json::from_slice(bytes)
            .map_err(|e| RouteError::NetworkFormat(format!("json parse: {e}")))?;
        if !root.get("features").map(Value::is_array).unwrap_or(false) {
            return Err(RouteError::NetworkFormat(
                "document has no 'features' array".to_string(),
            ));
        }
        serde_json::from_value(root)
            .map_err(|e| RouteError::NetworkFormat(format!("decode features: {e}")))
    }

    /// All polylines that become road segments, in document order
    pub fn road_lines(&self) -> Vec<Vec<Option<Position>>> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(Geometry::road_lines)
            .collect()
    }
}

impl Geometry {
    /// LineString, MultiLineString, the outer ring of a Polygon and the outer
    /// ring of each MultiPolygon member. Other types contribute nothing.
    pub fn road_lines(&self) -> Vec<Vec<Option<Position>>> {
        let coords = &self.coordinates;
        match self.kind.to_ascii_lowercase().as_str() {
            "linestring" => vec![line(coords)],
            "multilinestring" => members(coords).map(line).collect(),
            "polygon" => members(coords).take(1).map(line).collect(),
            "multipolygon" => members(coords)
                .filter_map(|poly| members(poly).next())
                .map(line)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn members(value: &Value) -> impl Iterator<Item = &Value> {
    value.as_array().into_iter().flatten()
}

// A malformed position is kept as `None` so the caller can break the line there.
fn line(value: &Value) -> Vec<Option<Position>> {
    members(value).map(position).collect()
}

fn position(value: &Value) -> Option<Position> {
    let arr = value.as_array()?;
    let lon = arr.first()?.as_f64()?;
    let lat = arr.get(1)?.as_f64()?;
    Some([lon, lat])
}
