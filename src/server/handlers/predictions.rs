use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json};

use crate::api::PredictionInput;
use crate::entities::RoutePlan;
use crate::error::{invalid_input_error, Error};
use crate::server::DynAPI;

pub async fn create(
    Extension(api): Extension<DynAPI>,
    params: Result<Json<PredictionInput>, JsonRejection>,
) -> Result<Json<RoutePlan>, Error> {
    let Json(params) = params.map_err(|rejection| invalid_input_error(rejection.to_string()))?;

    let plan = api.predict_route(params).await?;

    Ok(plan.into())
}
