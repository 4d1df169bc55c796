use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use std::fmt;

use crate::entities::Stage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    ModelUnavailable,
    InvalidInput,
    RouteApi,
    Upstream,
    Unexpected,
}

#[derive(Clone, Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub stage: Option<Stage>,
}

impl Error {
    /// Records the stage a prediction run failed in. The first stage wins.
    pub fn at(mut self, stage: Stage) -> Self {
        if self.stage.is_none() {
            self.stage = Some(stage);
        }

        self
    }

    pub fn code(&self) -> i32 {
        match self.kind {
            ErrorKind::Config => 1,
            ErrorKind::ModelUnavailable => 2,
            ErrorKind::Upstream => 4,
            ErrorKind::Unexpected => 5,
            ErrorKind::InvalidInput => 101,
            ErrorKind::RouteApi => 102,
        }
    }

    pub fn is_startup_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Config | ErrorKind::ModelUnavailable)
    }

    /// The single line shown to the user when a prediction run fails.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::RouteApi => format!("Route Fetching Failed: {}", self.message),
            ErrorKind::InvalidInput => format!("Invalid Input: {}", self.message),
            _ => format!("An error occurred: {}", self.message),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        decode_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self.kind {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::RouteApi | ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "code": self.code(),
            "kind": self.kind,
            "stage": self.stage,
            "error": self.user_message(),
        }));

        (status, body).into_response()
    }
}

pub fn invalid_input_error(message: impl Into<String>) -> Error {
    Error {
        kind: ErrorKind::InvalidInput,
        message: message.into(),
        stage: None,
    }
}

pub fn route_api_error(message: impl Into<String>) -> Error {
    Error {
        kind: ErrorKind::RouteApi,
        message: message.into(),
        stage: None,
    }
}

pub fn model_unavailable_error(message: impl Into<String>) -> Error {
    Error {
        kind: ErrorKind::ModelUnavailable,
        message: message.into(),
        stage: None,
    }
}

pub fn config_error(message: impl Into<String>) -> Error {
    Error {
        kind: ErrorKind::Config,
        message: message.into(),
        stage: None,
    }
}

// request urls carry api keys in their query
pub fn reqwest_error(err: reqwest::Error) -> Error {
    Error {
        kind: ErrorKind::Upstream,
        message: err.without_url().to_string(),
        stage: None,
    }
}

pub fn decode_error(err: serde_json::Error) -> Error {
    Error {
        kind: ErrorKind::Unexpected,
        message: format!("malformed response: {}", err),
        stage: None,
    }
}

pub fn upstream_error(message: impl Into<String>) -> Error {
    Error {
        kind: ErrorKind::Upstream,
        message: message.into(),
        stage: None,
    }
}

pub fn unexpected_error(message: impl Into<String>) -> Error {
    Error {
        kind: ErrorKind::Unexpected,
        message: message.into(),
        stage: None,
    }
}

#[test]
fn route_api_error_message_is_distinct() {
    let route = route_api_error("403 (Access to this API has been disallowed)");
    let generic = upstream_error("connection refused");

    assert_eq!(
        route.user_message(),
        "Route Fetching Failed: 403 (Access to this API has been disallowed)"
    );
    assert_eq!(generic.user_message(), "An error occurred: connection refused");
    assert_ne!(route.code(), generic.code());
}

#[test]
fn startup_fatal_kinds() {
    assert!(model_unavailable_error("missing").is_startup_fatal());
    assert!(config_error("missing key").is_startup_fatal());
    assert!(!invalid_input_error("bad").is_startup_fatal());
    assert!(!route_api_error("bad").is_startup_fatal());
}

#[test]
fn error_response_status() {
    let response = invalid_input_error("bad").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = route_api_error("bad").into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = unexpected_error("bad").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn first_failed_stage_is_kept() {
    let err = route_api_error("bad")
        .at(Stage::FetchingRoute)
        .at(Stage::Rendering);

    assert_eq!(err.stage, Some(Stage::FetchingRoute));
}
