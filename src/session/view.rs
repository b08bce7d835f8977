// Map view state
// Layers, markers and viewport of a map session, kept as plain data so
// the pairing flow can be driven and asserted without a renderer
//
// Numan Thabit 2025 Nov

use crate::network::{FeatureCollection, GeoPoint};
use geo::{BoundingRect, LineString};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: u32,
    pub opacity: f32,
}

pub const NETWORK_STYLE: LineStyle = LineStyle {
    color: "blue",
    weight: 3,
    opacity: 0.5,
};

pub const ROUTE_STYLE: LineStyle = LineStyle {
    color: "red",
    weight: 6,
    opacity: 0.9,
};

pub const INITIAL_CENTER: GeoPoint = GeoPoint {
    lat: 40.765,
    lon: 29.94,
};
pub const INITIAL_ZOOM: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerEvent {
    Added(LayerId),
    Removed(LayerId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub max_zoom: u8,
    pub attribution: String,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            max_zoom: 19,
            attribution: "© OpenStreetMap".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkLayer {
    pub id: LayerId,
    pub features: usize,
    pub lines: usize,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub id: LayerId,
    pub points: Vec<GeoPoint>,
    pub style: LineStyle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub point: GeoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn around(points: &[GeoPoint]) -> Option<Self> {
        let line: LineString<f64> = points.iter().map(|p| (p.lon, p.lat)).collect();
        line.bounding_rect().map(|rect| Self {
            south: rect.min().y,
            west: rect.min().x,
            north: rect.max().y,
            east: rect.max().x,
        })
    }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        (self.south..=self.north).contains(&p.lat) && (self.west..=self.east).contains(&p.lon)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lat: (self.south + self.north) / 2.0,
            lon: (self.west + self.east) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: GeoPoint,
    pub zoom: u8,
    pub bounds: Option<Bounds>,
}

#[derive(Debug)]
pub struct RouteView {
    tile_layer: TileLayer,
    base_layer: Option<NetworkLayer>,
    markers: Vec<Marker>,
    route: Option<Polyline>,
    viewport: Viewport,
    history: Vec<LayerEvent>,
    next_layer: u64,
}

impl Default for RouteView {
    fn default() -> Self {
        Self {
            tile_layer: TileLayer::default(),
            base_layer: None,
            markers: Vec::new(),
            route: None,
            viewport: Viewport {
                center: INITIAL_CENTER,
                zoom: INITIAL_ZOOM,
                bounds: None,
            },
            history: Vec::new(),
            next_layer: 1,
        }
    }
}

impl RouteView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tile_layer(&self) -> &TileLayer {
        &self.tile_layer
    }

    pub fn base_layer(&self) -> Option<&NetworkLayer> {
        self.base_layer.as_ref()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn route(&self) -> Option<&Polyline> {
        self.route.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Layer additions and removals in the order they happened
    pub fn history(&self) -> &[LayerEvent] {
        &self.history
    }

    pub fn add_marker(&mut self, point: GeoPoint) {
        self.markers.push(Marker { point });
    }

    pub fn set_base_layer(&mut self, collection: &FeatureCollection) -> LayerId {
        if let Some(old) = self.base_layer.take() {
            self.history.push(LayerEvent::Removed(old.id));
        }
        let id = self.allocate();
        self.base_layer = Some(NetworkLayer {
            id,
            features: collection.features.len(),
            lines: collection.road_lines().len(),
            style: NETWORK_STYLE,
        });
        self.history.push(LayerEvent::Added(id));
        id
    }

    /// Replace the displayed route. The old layer is removed before the new
    /// one is added; an empty route only clears the map.
    pub fn show_route(&mut self, points: Vec<GeoPoint>) -> Option<LayerId> {
        if let Some(old) = self.route.take() {
            self.history.push(LayerEvent::Removed(old.id));
        }
        let bounds = Bounds::around(&points)?;

        let id = self.allocate();
        self.route = Some(Polyline {
            id,
            points,
            style: ROUTE_STYLE,
        });
        self.history.push(LayerEvent::Added(id));
        self.viewport.center = bounds.center();
        self.viewport.bounds = Some(bounds);
        Some(id)
    }

    fn allocate(&mut self) -> LayerId {
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn starts_with_tiles_only() {
        let view = RouteView::new();
        assert_eq!(view.tile_layer().max_zoom, 19);
        assert!(view.base_layer().is_none());
        assert!(view.route().is_none());
        assert_eq!(view.viewport().center, INITIAL_CENTER);
        assert_eq!(view.viewport().zoom, INITIAL_ZOOM);
    }

    #[test]
    fn replacing_a_route_removes_the_old_layer_first() {
        let mut view = RouteView::new();
        let first = view.show_route(vec![pt(1.0, 1.0), pt(2.0, 2.0)]).unwrap();
        let second = view.show_route(vec![pt(3.0, 3.0), pt(4.0, 5.0)]).unwrap();

        assert_eq!(
            view.history(),
            &[
                LayerEvent::Added(first),
                LayerEvent::Removed(first),
                LayerEvent::Added(second),
            ]
        );
        let route = view.route().unwrap();
        assert_eq!(route.id, second);
        assert_eq!(route.style, ROUTE_STYLE);
    }

    #[test]
    fn viewport_fits_the_route() {
        let mut view = RouteView::new();
        let points = vec![pt(40.70, 29.90), pt(40.75, 29.95), pt(40.80, 30.00)];
        view.show_route(points.clone());
        let bounds = view.viewport().bounds.unwrap();
        assert!(points.iter().all(|p| bounds.contains(p)));
        assert_eq!(bounds.south, 40.70);
        assert_eq!(bounds.east, 30.00);
    }

    #[test]
    fn empty_route_clears_without_refitting() {
        let mut view = RouteView::new();
        view.show_route(vec![pt(1.0, 1.0)]);
        let before = *view.viewport();
        assert_eq!(view.show_route(Vec::new()), None);
        assert!(view.route().is_none());
        assert_eq!(*view.viewport(), before);
    }

    #[test]
    fn base_layer_uses_network_style() {
        let mut view = RouteView::new();
        let fc: FeatureCollection = serde_json::from_value(serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {"type":"Feature","geometry":{"type":"LineString","coordinates":[[29.9,40.7],[30.0,40.8]]}}
            ]
        }))
        .unwrap();
        view.set_base_layer(&fc);
        let layer = view.base_layer().unwrap();
        assert_eq!(layer.style, NETWORK_STYLE);
        assert_eq!((layer.features, layer.lines), (1, 1));
    }
}
