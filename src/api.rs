use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::RoutePlan;
use crate::error::Error;

/// Raw values as entered by the user, before any validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictionInput {
    pub origin: String,
    pub destination: String,
    pub traffic_condition: i64,
    pub battery_level: i64,
}

impl Default for PredictionInput {
    fn default() -> Self {
        Self {
            origin: "12.9716,77.5946".into(),
            destination: "13.0827,80.2707".into(),
            traffic_condition: 1,
            battery_level: 80,
        }
    }
}

#[async_trait]
pub trait PredictionAPI {
    async fn predict_route(&self, input: PredictionInput) -> Result<RoutePlan, Error>;
}

pub trait API: PredictionAPI {}
