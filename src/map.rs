use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::entities::{Bounds, ChargingStation, Coordinates, RouteGeometry};
use crate::error::{unexpected_error, Error};

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Polyline {
    pub points: Vec<[f64; 2]>,
    pub color: String,
    pub weight: u32,
    pub opacity: f64,
}

impl Polyline {
    pub fn route(geometry: &RouteGeometry) -> Self {
        Self {
            points: geometry
                .line_string()
                .coords()
                .map(|&c| Coordinates::from(c).to_lat_lon())
                .collect(),
            color: "blue".into(),
            weight: 5,
            opacity: 0.7,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Icon {
    pub color: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Marker {
    pub location: [f64; 2],
    pub label: String,
    pub icon: Icon,
}

impl Marker {
    pub fn charging_station(station: &ChargingStation) -> Self {
        Self {
            location: station.location.to_lat_lon(),
            label: format!("⚡ {}", station.name),
            icon: Icon {
                color: "green".into(),
                name: "bolt".into(),
            },
        }
    }
}

/// What to draw: an initial view, a route line, point markers and the bounds
/// the view is fitted to once drawn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub polyline: Polyline,
    pub markers: Vec<Marker>,
    pub fit_bounds: Option<[[f64; 2]; 2]>,
}

impl MapView {
    pub fn new(origin: Coordinates, route: &RouteGeometry, stations: &[ChargingStation]) -> Self {
        Self {
            center: origin.to_lat_lon(),
            zoom: 7,
            polyline: Polyline::route(route),
            markers: stations.iter().map(Marker::charging_station).collect(),
            fit_bounds: route.bounds().map(|b: Bounds| {
                [b.south_west.to_lat_lon(), b.north_east.to_lat_lon()]
            }),
        }
    }
}

pub trait MapRenderer {
    fn render(&self, view: &MapView) -> Result<String, Error>;
}

/// Renders a self-contained Leaflet map as an HTML fragment.
#[derive(Clone, Debug, Default)]
pub struct LeafletRenderer;

impl MapRenderer for LeafletRenderer {
    fn render(&self, view: &MapView) -> Result<String, Error> {
        let points_finite = view
            .polyline
            .points
            .iter()
            .chain(view.markers.iter().map(|m| &m.location))
            .chain(std::iter::once(&view.center))
            .flatten()
            .all(|v| v.is_finite());

        if !points_finite {
            return Err(unexpected_error("map contains non-finite coordinates"));
        }

        let id = format!("map_{}", Uuid::new_v4().simple());
        let data = script_json(&json!({
            "center": view.center,
            "zoom": view.zoom,
            "polyline": view.polyline,
            "markers": view.markers,
            "fit_bounds": view.fit_bounds,
        }))?;

        Ok(format!(
            r#"<link rel="stylesheet" href="{css}"/>
<script src="{js}"></script>
<div id="{id}" class="route-map" style="width: 100%; height: 520px;"></div>
<script>
(function () {{
  var view = {data};
  var map = L.map("{id}").setView(view.center, view.zoom);
  L.tileLayer("{tiles}", {{ attribution: '{attribution}' }}).addTo(map);
  L.polyline(view.polyline.points, {{
    color: view.polyline.color,
    weight: view.polyline.weight,
    opacity: view.polyline.opacity
  }}).addTo(map);
  if (view.fit_bounds) {{
    map.fitBounds(view.fit_bounds);
  }}
  view.markers.forEach(function (marker) {{
    var icon = L.divIcon({{
      className: "marker-icon marker-" + marker.icon.color,
      html: '<span class="icon-' + marker.icon.name + '" style="color:' + marker.icon.color + '">&#9889;</span>'
    }});
    L.marker(marker.location, {{ icon: icon }})
      .bindPopup(document.createTextNode(marker.label))
      .addTo(map);
  }});
}})();
</script>"#,
            css = LEAFLET_CSS,
            js = LEAFLET_JS,
            id = id,
            data = data,
            tiles = TILE_URL,
            attribution = TILE_ATTRIBUTION,
        ))
    }
}

/// JSON that is safe to inline inside a `<script>` element.
fn script_json(value: &serde_json::Value) -> Result<String, Error> {
    let json = serde_json::to_string(value)?;

    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

#[cfg(test)]
fn sample_view() -> MapView {
    let route = RouteGeometry::new(vec![
        Coordinates { lat: 12.9716, lon: 77.5946 },
        Coordinates { lat: 13.0827, lon: 80.2707 },
    ]);
    let stations = vec![ChargingStation::new(
        "MG Road Charger",
        Coordinates { lat: 12.975, lon: 77.606 },
    )];

    MapView::new(route.points[0], &route, &stations)
}

#[test]
fn view_fits_route_bounds() {
    let view = sample_view();

    assert_eq!(view.center, [12.9716, 77.5946]);
    assert_eq!(view.zoom, 7);
    assert_eq!(
        view.fit_bounds,
        Some([[12.9716, 77.5946], [13.0827, 80.2707]])
    );
    assert_eq!(view.polyline.points, vec![[12.9716, 77.5946], [13.0827, 80.2707]]);
    assert_eq!(view.polyline.color, "blue");
}

#[test]
fn polyline_keeps_route_order_as_lat_lon() {
    let route = RouteGeometry::from_lon_lat_pairs(&[
        vec![77.5946, 12.9716],
        vec![79.0, 12.8],
        vec![80.2707, 13.0827],
    ])
    .unwrap();

    let polyline = Polyline::route(&route);

    assert_eq!(
        polyline.points,
        vec![[12.9716, 77.5946], [12.8, 79.0], [13.0827, 80.2707]]
    );
    assert_eq!(polyline.weight, 5);
    assert_eq!(polyline.opacity, 0.7);
}

#[test]
fn station_markers_are_labelled() {
    let view = sample_view();

    assert_eq!(view.markers.len(), 1);
    assert_eq!(view.markers[0].label, "⚡ MG Road Charger");
    assert_eq!(view.markers[0].location, [12.975, 77.606]);
    assert_eq!(view.markers[0].icon.color, "green");
    assert_eq!(view.markers[0].icon.name, "bolt");
}

#[test]
fn render_includes_route_and_fit_bounds() {
    let html = LeafletRenderer.render(&sample_view()).unwrap();

    assert!(html.contains("map.fitBounds(view.fit_bounds)"));
    assert!(html.contains("[[12.9716,77.5946],[13.0827,80.2707]]"));
    assert!(html.contains("MG Road Charger"));
}

#[test]
fn render_escapes_station_names() {
    let route = RouteGeometry::new(vec![Coordinates { lat: 1.0, lon: 2.0 }]);
    let stations = vec![ChargingStation::new(
        "</script><script>alert(1)</script>",
        Coordinates { lat: 1.0, lon: 2.0 },
    )];
    let view = MapView::new(route.points[0], &route, &stations);

    let html = LeafletRenderer.render(&view).unwrap();
    assert!(!html.contains("</script><script>alert(1)"));
    assert!(html.contains("\\u003c/script\\u003e"));
}

#[test]
fn render_rejects_non_finite_points() {
    let mut view = sample_view();
    view.polyline.points.push([f64::NAN, 1.0]);

    assert!(LeafletRenderer.render(&view).is_err());
}
