use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{ChargingStation, RouteGeometry, RouteQuery};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub minutes: f64,
}

impl PredictionResult {
    pub fn message(&self) -> String {
        format!("Estimated Travel Time: {:.2} minutes", self.minutes)
    }
}

/// Progress of a single prediction run. `Idle` is both the initial and the
/// terminal state; nothing is carried between runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Parsing,
    Predicting,
    FetchingRoute,
    FetchingStations,
    Rendering,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Parsing => "parsing",
            Self::Predicting => "predicting",
            Self::FetchingRoute => "fetching_route",
            Self::FetchingStations => "fetching_stations",
            Self::Rendering => "rendering",
        }
    }
}

/// Everything produced by one successful run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutePlan {
    pub request_id: Uuid,
    pub query: RouteQuery,
    pub result: PredictionResult,
    pub message: String,
    pub route: RouteGeometry,
    pub stations: Vec<ChargingStation>,
    pub map_html: String,
}

#[test]
fn message_uses_two_decimals() {
    assert_eq!(
        PredictionResult { minutes: 45.0 }.message(),
        "Estimated Travel Time: 45.00 minutes"
    );
    assert_eq!(
        PredictionResult { minutes: 41.666666 }.message(),
        "Estimated Travel Time: 41.67 minutes"
    );
}
