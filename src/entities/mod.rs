mod features;
mod location;
mod prediction;
mod query;
mod route;
mod station;

pub use features::{PredictionFeatures, FEATURE_NAMES};
pub use location::Coordinates;
pub use prediction::{PredictionResult, RoutePlan, Stage};
pub use query::{BatteryLevel, RouteQuery, TrafficCondition};
pub use route::{Bounds, Profile, RouteGeometry};
pub use station::ChargingStation;
