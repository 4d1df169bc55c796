use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;
use crate::error::{invalid_input_error, Error};

/// Serialized as its ordinal so a plan's query reads back as request input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum TrafficCondition {
    Light,
    Moderate,
    Heavy,
}

impl TrafficCondition {
    pub const ALL: [TrafficCondition; 3] = [Self::Light, Self::Moderate, Self::Heavy];

    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Light => 1,
            Self::Moderate => 2,
            Self::Heavy => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Moderate => "Moderate",
            Self::Heavy => "Heavy",
        }
    }
}

impl TryFrom<i64> for TrafficCondition {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Light),
            2 => Ok(Self::Moderate),
            3 => Ok(Self::Heavy),
            _ => Err(invalid_input_error(format!(
                "traffic condition must be 1, 2 or 3, got {}",
                value
            ))),
        }
    }
}

impl From<TrafficCondition> for u8 {
    fn from(condition: TrafficCondition) -> Self {
        condition.ordinal()
    }
}

/// Battery charge in whole percent, always within `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct BatteryLevel(u8);

impl BatteryLevel {
    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for BatteryLevel {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0..=100 => Ok(Self(value as u8)),
            _ => Err(invalid_input_error(format!(
                "battery level must be within 0..=100, got {}",
                value
            ))),
        }
    }
}

impl From<BatteryLevel> for u8 {
    fn from(level: BatteryLevel) -> Self {
        level.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub traffic_condition: TrafficCondition,
    pub battery_level: BatteryLevel,
}

impl RouteQuery {
    /// Validates raw user input. Traffic and battery values outside their
    /// ranges are rejected, never clamped.
    pub fn parse(
        origin: &str,
        destination: &str,
        traffic_condition: i64,
        battery_level: i64,
    ) -> Result<Self, Error> {
        Ok(Self {
            origin: origin.parse()?,
            destination: destination.parse()?,
            traffic_condition: TrafficCondition::try_from(traffic_condition)?,
            battery_level: BatteryLevel::try_from(battery_level)?,
        })
    }
}

#[test]
fn parse_query() {
    let query = RouteQuery::parse("12.9716,77.5946", "13.0827,80.2707", 2, 80).unwrap();

    assert_eq!(query.origin, Coordinates { lat: 12.9716, lon: 77.5946 });
    assert_eq!(query.destination, Coordinates { lat: 13.0827, lon: 80.2707 });
    assert_eq!(query.traffic_condition, TrafficCondition::Moderate);
    assert_eq!(query.battery_level.percent(), 80);
}

#[test]
fn parse_query_rejects_out_of_range_values() {
    assert!(RouteQuery::parse("12.9716,77.5946", "13.0827,80.2707", 0, 80).is_err());
    assert!(RouteQuery::parse("12.9716,77.5946", "13.0827,80.2707", 4, 80).is_err());
    assert!(RouteQuery::parse("12.9716,77.5946", "13.0827,80.2707", 2, -1).is_err());
    assert!(RouteQuery::parse("12.9716,77.5946", "13.0827,80.2707", 2, 101).is_err());
    assert!(RouteQuery::parse("12.9716,77.5946", "13.0827,80.2707", 3, 0).is_ok());
    assert!(RouteQuery::parse("12.9716,77.5946", "13.0827,80.2707", 1, 100).is_ok());
}

#[test]
fn parse_query_rejects_bad_coordinates() {
    assert!(RouteQuery::parse("12.9716", "13.0827,80.2707", 2, 80).is_err());
    assert!(RouteQuery::parse("12.9716,77.5946", "abc,def", 2, 80).is_err());
}

#[test]
fn battery_level_deserialize_rejects_out_of_range() {
    assert!(serde_json::from_str::<BatteryLevel>("101").is_err());
    assert_eq!(serde_json::from_str::<BatteryLevel>("55").unwrap().percent(), 55);
}

#[test]
fn traffic_condition_serializes_as_ordinal() {
    assert_eq!(serde_json::to_string(&TrafficCondition::Moderate).unwrap(), "2");
    assert_eq!(
        serde_json::from_str::<TrafficCondition>("3").unwrap(),
        TrafficCondition::Heavy
    );
    assert!(serde_json::from_str::<TrafficCondition>("5").is_err());
    assert!(serde_json::from_str::<TrafficCondition>("\"moderate\"").is_err());
}

#[test]
fn query_reads_back_as_request_input() {
    let query = RouteQuery::parse("12.9716,77.5946", "13.0827,80.2707", 2, 80).unwrap();

    let value = serde_json::to_value(&query).unwrap();
    let traffic = value["traffic_condition"].as_i64().unwrap();
    let battery = value["battery_level"].as_i64().unwrap();

    let reparsed = RouteQuery::parse("12.9716,77.5946", "13.0827,80.2707", traffic, battery).unwrap();
    assert_eq!(reparsed, query);
}
