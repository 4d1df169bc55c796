mod prediction_api;

use std::sync::Arc;

use crate::{
    api::API,
    config::Config,
    error::Error,
    external::{self, OpenChargeMap, OpenRouteService, RouteProvider, StationProvider},
    map::{LeafletRenderer, MapRenderer},
    predictor::Predictor,
};

/// Number of charging stations requested around the origin.
pub const MAX_STATIONS: usize = 10;

pub type DynRouteProvider = Arc<dyn RouteProvider + Send + Sync>;
pub type DynStationProvider = Arc<dyn StationProvider + Send + Sync>;
pub type DynMapRenderer = Arc<dyn MapRenderer + Send + Sync>;

/// Runs prediction requests against a model and providers built once at
/// startup. Holds no per-request state.
pub struct Engine {
    predictor: Arc<Predictor>,
    routes: DynRouteProvider,
    stations: DynStationProvider,
    renderer: DynMapRenderer,
}

impl Engine {
    pub fn new(
        predictor: Arc<Predictor>,
        routes: DynRouteProvider,
        stations: DynStationProvider,
        renderer: DynMapRenderer,
    ) -> Self {
        Self {
            predictor,
            routes,
            stations,
            renderer,
        }
    }

    /// Loads the model and wires the HTTP providers. A missing or invalid
    /// model fails here, before anything is served.
    #[tracing::instrument(name = "Engine::from_config", skip_all)]
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let predictor = Predictor::load(&config.model_path)?;
        let client = external::http_client(config.http_timeout)?;

        let routes = OpenRouteService::new(
            client.clone(),
            config.ors_api_base.clone(),
            config.ors_api_key.clone(),
        );
        let stations = OpenChargeMap::new(
            client,
            config.open_charge_map_api_base.clone(),
            config.open_charge_map_api_key.clone(),
        );

        Ok(Self::new(
            Arc::new(predictor),
            Arc::new(routes),
            Arc::new(stations),
            Arc::new(LeafletRenderer),
        ))
    }
}

impl API for Engine {}
