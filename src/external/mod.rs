pub mod open_charge_map;
pub mod openrouteservice;

use async_trait::async_trait;
use std::time::Duration;

use crate::entities::{ChargingStation, Coordinates, Profile, RouteGeometry};
use crate::error::{config_error, Error};

pub use open_charge_map::OpenChargeMap;
pub use openrouteservice::OpenRouteService;

/// Turns two points into a drivable path.
#[async_trait]
pub trait RouteProvider {
    async fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteGeometry, Error>;
}

/// Looks up charging stations around a point.
#[async_trait]
pub trait StationProvider {
    async fn nearby(
        &self,
        location: Coordinates,
        max_results: usize,
    ) -> Result<Vec<ChargingStation>, Error>;
}

/// Shared HTTP client for both providers. Without a timeout a request waits
/// until the upstream answers or the connection fails.
pub fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client, Error> {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|err| config_error(format!("http client could not be built: {}", err)))
}
