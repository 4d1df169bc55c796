use serde::{Deserialize, Serialize};

use crate::entities::RouteQuery;

/// Column order the model was trained with.
pub const FEATURE_NAMES: [&str; 6] = [
    "origin_lat",
    "origin_lon",
    "dest_lat",
    "dest_lon",
    "traffic_condition",
    "battery_level",
];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionFeatures(pub [f64; 6]);

impl PredictionFeatures {
    pub fn values(&self) -> &[f64; 6] {
        &self.0
    }
}

impl From<&RouteQuery> for PredictionFeatures {
    fn from(query: &RouteQuery) -> Self {
        Self([
            query.origin.lat,
            query.origin.lon,
            query.destination.lat,
            query.destination.lon,
            query.traffic_condition.ordinal() as f64,
            query.battery_level.percent() as f64,
        ])
    }
}

#[test]
fn features_follow_training_column_order() {
    let query = RouteQuery::parse("12.9716,77.5946", "13.0827,80.2707", 2, 80).unwrap();
    let features = PredictionFeatures::from(&query);

    assert_eq!(
        features.values(),
        &[12.9716, 77.5946, 13.0827, 80.2707, 2.0, 80.0]
    );
}
