use geo_types::{Coord, LineString, Rect};
use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;
use crate::error::{unexpected_error, Error};

/// Routing mode passed to the route provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    DrivingCar,
}

impl Profile {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DrivingCar => "driving-car",
        }
    }
}

/// South-west and north-east corners of a geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            south_west: rect.min().into(),
            north_east: rect.max().into(),
        }
    }
}

/// Ordered route points in (lat, lon) display order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    pub points: Vec<Coordinates>,
}

impl RouteGeometry {
    pub fn new(points: Vec<Coordinates>) -> Self {
        Self { points }
    }

    /// Converts provider coordinates, which arrive as `[lon, lat]`.
    pub fn from_lon_lat_pairs(pairs: &[Vec<f64>]) -> Result<Self, Error> {
        let points = pairs
            .iter()
            .map(|pair| Coordinates::from_lon_lat(pair))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { points })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn line_string(&self) -> LineString<f64> {
        self.points.iter().map(|&p| Coord::from(p)).collect()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.points.first()?;
        let mut south_west = *first;
        let mut north_east = *first;

        for p in &self.points[1..] {
            south_west.lat = south_west.lat.min(p.lat);
            south_west.lon = south_west.lon.min(p.lon);
            north_east.lat = north_east.lat.max(p.lat);
            north_east.lon = north_east.lon.max(p.lon);
        }

        let rect = Rect::new(Coord::from(south_west), Coord::from(north_east));

        Some(rect.into())
    }

    pub fn ensure_not_empty(self) -> Result<Self, Error> {
        if self.is_empty() {
            return Err(unexpected_error("route geometry contains no points"));
        }

        Ok(self)
    }
}

#[test]
fn geometry_flips_provider_order() {
    let geometry =
        RouteGeometry::from_lon_lat_pairs(&[vec![77.5946, 12.9716], vec![80.2707, 13.0827]])
            .unwrap();

    let points: Vec<[f64; 2]> = geometry.points.iter().map(|p| p.to_lat_lon()).collect();
    assert_eq!(points, vec![[12.9716, 77.5946], [13.0827, 80.2707]]);
}

#[test]
fn geometry_bounds_cover_every_point() {
    let geometry = RouteGeometry::new(vec![
        Coordinates { lat: 12.9716, lon: 77.5946 },
        Coordinates { lat: 12.5, lon: 79.0 },
        Coordinates { lat: 13.0827, lon: 80.2707 },
    ]);

    let bounds = geometry.bounds().unwrap();
    assert_eq!(bounds.south_west, Coordinates { lat: 12.5, lon: 77.5946 });
    assert_eq!(bounds.north_east, Coordinates { lat: 13.0827, lon: 80.2707 });
}

#[test]
fn line_string_uses_lon_as_x() {
    let geometry = RouteGeometry::new(vec![
        Coordinates { lat: 12.9716, lon: 77.5946 },
        Coordinates { lat: 13.0827, lon: 80.2707 },
    ]);

    let line = geometry.line_string();
    assert_eq!(line.0.len(), 2);
    assert_eq!(line.0[0], Coord { x: 77.5946, y: 12.9716 });
    assert_eq!(line.0[1], Coord { x: 80.2707, y: 13.0827 });
}

#[test]
fn empty_geometry_has_no_bounds() {
    let geometry = RouteGeometry::default();

    assert!(geometry.bounds().is_none());
    assert!(geometry.ensure_not_empty().is_err());
}
