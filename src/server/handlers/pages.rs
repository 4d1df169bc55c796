use axum::extract::{Extension, Form};
use axum::response::Html;
use serde::{Deserialize, Serialize};

use crate::api::PredictionInput;
use crate::error::{invalid_input_error, Error};
use crate::server::page::{self, Outcome};
use crate::server::DynAPI;

/// Form fields arrive as text so that bad numbers are reported inline
/// instead of being rejected by the extractor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PredictParams {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub traffic_condition: String,
    #[serde(default)]
    pub battery_level: String,
}

impl PredictParams {
    fn to_input(&self) -> Result<PredictionInput, Error> {
        Ok(PredictionInput {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            traffic_condition: parse_integer("traffic condition", &self.traffic_condition)?,
            battery_level: parse_integer("battery level", &self.battery_level)?,
        })
    }
}

impl From<&PredictionInput> for PredictParams {
    fn from(input: &PredictionInput) -> Self {
        Self {
            origin: input.origin.clone(),
            destination: input.destination.clone(),
            traffic_condition: input.traffic_condition.to_string(),
            battery_level: input.battery_level.to_string(),
        }
    }
}

fn parse_integer(field: &str, value: &str) -> Result<i64, Error> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| invalid_input_error(format!("{} must be a whole number, got {:?}", field, value)))
}

pub async fn index() -> Html<String> {
    let params = PredictParams::from(&PredictionInput::default());

    Html(page::render(&params, None))
}

pub async fn predict(
    Extension(api): Extension<DynAPI>,
    Form(params): Form<PredictParams>,
) -> Html<String> {
    let result = match params.to_input() {
        Ok(input) => api.predict_route(input).await,
        Err(err) => Err(err),
    };

    let outcome = match result {
        Ok(plan) => Outcome::Success {
            map_html: plan.map_html,
            message: plan.message,
        },
        Err(err) => Outcome::Failure {
            message: err.user_message(),
        },
    };

    Html(page::render(&params, Some(&outcome)))
}

#[test]
fn form_values_must_be_integers() {
    let params = PredictParams {
        origin: "12.9716,77.5946".into(),
        destination: "13.0827,80.2707".into(),
        traffic_condition: "two".into(),
        battery_level: "80".into(),
    };

    let err = params.to_input().unwrap_err();
    assert!(err.user_message().starts_with("Invalid Input: traffic condition"));

    let params = PredictParams {
        traffic_condition: " 2 ".into(),
        ..params
    };
    let input = params.to_input().unwrap();
    assert_eq!(input.traffic_condition, 2);
    assert_eq!(input.battery_level, 80);
}
