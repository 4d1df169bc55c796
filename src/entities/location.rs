use geo_types::{coord, Coord};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{invalid_input_error, unexpected_error, Error};

/// A WGS84 point in (lat, lon) display order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, Error> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(invalid_input_error(format!(
                "latitude {} is outside [-90, 90]",
                lat
            )));
        }

        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(invalid_input_error(format!(
                "longitude {} is outside [-180, 180]",
                lon
            )));
        }

        Ok(Self { lat, lon })
    }

    /// Builds a point from a provider pair ordered `[lon, lat, ...]`.
    /// Any trailing values (elevation) are ignored.
    pub fn from_lon_lat(pair: &[f64]) -> Result<Self, Error> {
        match pair {
            [lon, lat, ..] => Ok(Self {
                lat: *lat,
                lon: *lon,
            }),
            _ => Err(unexpected_error(format!(
                "expected a [lon, lat] pair, got {} values",
                pair.len()
            ))),
        }
    }

    pub fn to_lon_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    pub fn to_lat_lon(&self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

impl FromStr for Coordinates {
    type Err = Error;

    /// Parses `"lat,lon"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split(',').collect();

        let (lat, lon) = match tokens.as_slice() {
            [lat, lon] => (parse_degrees(lat, s)?, parse_degrees(lon, s)?),
            _ => {
                return Err(invalid_input_error(format!(
                    "expected \"lat,lon\", got {:?}",
                    s
                )))
            }
        };

        Self::new(lat, lon)
    }
}

fn parse_degrees(token: &str, input: &str) -> Result<f64, Error> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            invalid_input_error(format!("expected \"lat,lon\", got {:?}", input))
        })
}

// geo-types works in x/y, so x is longitude.
impl From<Coordinates> for Coord<f64> {
    fn from(coordinates: Coordinates) -> Self {
        coord! { x: coordinates.lon, y: coordinates.lat }
    }
}

impl From<Coord<f64>> for Coordinates {
    fn from(c: Coord<f64>) -> Self {
        Self { lat: c.y, lon: c.x }
    }
}

#[test]
fn parse_valid_coordinates() {
    let coordinates: Coordinates = "12.9716,77.5946".parse().unwrap();
    assert_eq!(coordinates, Coordinates { lat: 12.9716, lon: 77.5946 });

    let coordinates: Coordinates = " -33.8688 , 151.2093 ".parse().unwrap();
    assert_eq!(coordinates.to_lat_lon(), [-33.8688, 151.2093]);
}

#[test]
fn parse_rejects_malformed_coordinates() {
    use crate::error::ErrorKind;

    for input in ["12.9716", "abc,def", "1,2,3", "", ",", "12.9716,", "NaN,1", "1,inf"] {
        let err = input.parse::<Coordinates>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput, "input {:?}", input);
    }
}

#[test]
fn parse_rejects_out_of_range_coordinates() {
    assert!("91.0,0".parse::<Coordinates>().is_err());
    assert!("0,-180.5".parse::<Coordinates>().is_err());
    assert!("-90,180".parse::<Coordinates>().is_ok());
}

#[test]
fn provider_pairs_are_flipped() {
    let c = Coordinates::from_lon_lat(&[77.5946, 12.9716]).unwrap();
    assert_eq!(c.to_lat_lon(), [12.9716, 77.5946]);
    assert_eq!(c.to_lon_lat(), [77.5946, 12.9716]);

    let c = Coordinates::from_lon_lat(&[77.5946, 12.9716, 920.0]).unwrap();
    assert_eq!(c.lat, 12.9716);

    assert!(Coordinates::from_lon_lat(&[77.5946]).is_err());
}
