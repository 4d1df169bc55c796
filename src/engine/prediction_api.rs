use super::{Engine, MAX_STATIONS};

use async_trait::async_trait;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    api::{PredictionAPI, PredictionInput},
    entities::{PredictionFeatures, PredictionResult, Profile, RoutePlan, RouteQuery, Stage},
    error::Error,
    map::MapView,
};

impl Engine {
    async fn run(&self, request_id: Uuid, input: PredictionInput) -> Result<RoutePlan, Error> {
        let query = RouteQuery::parse(
            &input.origin,
            &input.destination,
            input.traffic_condition,
            input.battery_level,
        )
        .map_err(|err| err.at(Stage::Parsing))?;

        let features = PredictionFeatures::from(&query);
        let minutes = self
            .predictor
            .estimate(&features)
            .map_err(|err| err.at(Stage::Predicting))?;
        let result = PredictionResult { minutes };

        tracing::debug!(?features, minutes, "estimated travel time");

        let route = self
            .routes
            .directions(query.origin, query.destination, Profile::DrivingCar)
            .await
            .and_then(|route| route.ensure_not_empty())
            .map_err(|err| err.at(Stage::FetchingRoute))?;

        let stations = self
            .stations
            .nearby(query.origin, MAX_STATIONS)
            .await
            .map_err(|err| err.at(Stage::FetchingStations))?;

        let view = MapView::new(query.origin, &route, &stations);
        let map_html = self
            .renderer
            .render(&view)
            .map_err(|err| err.at(Stage::Rendering))?;

        Ok(RoutePlan {
            request_id,
            message: result.message(),
            query,
            result,
            route,
            stations,
            map_html,
        })
    }
}

#[async_trait]
impl PredictionAPI for Engine {
    async fn predict_route(&self, input: PredictionInput) -> Result<RoutePlan, Error> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "predict_route",
            %request_id,
            origin = %input.origin,
            destination = %input.destination
        );

        async move {
            let result = self.run(request_id, input).await;

            match &result {
                Ok(plan) => tracing::info!(
                    minutes = plan.result.minutes,
                    points = plan.route.len(),
                    stations = plan.stations.len(),
                    "prediction run succeeded"
                ),
                Err(err) => tracing::warn!(
                    kind = ?err.kind,
                    stage = err.stage.map(|s| s.name()).unwrap_or(Stage::Idle.name()),
                    error = %err,
                    "prediction run failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}
