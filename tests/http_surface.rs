use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Json, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use evroute::config::Config;
use evroute::engine::Engine;
use evroute::error::ErrorKind;
use evroute::server::{router, DynAPI};

const ORS_KEY: &str = "test-ors-key";

async fn directions(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let authorized = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == ORS_KEY)
        .unwrap_or(false);

    if !authorized {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Access to this API has been disallowed" })),
        );
    }

    // coordinates arrive as [lon, lat]
    assert_eq!(body["coordinates"], json!([[77.5946, 12.9716], [80.2707, 13.0827]]));

    (
        StatusCode::OK,
        Json(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[77.5946, 12.9716], [79.0, 12.8], [80.2707, 13.0827]]
                }
            }]
        })),
    )
}

async fn stations(Query(params): Query<Vec<(String, String)>>) -> Json<Value> {
    let get = |name: &str| {
        params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };

    assert_eq!(get("output").as_deref(), Some("json"));
    assert_eq!(get("latitude").as_deref(), Some("12.9716"));
    assert_eq!(get("longitude").as_deref(), Some("77.5946"));
    assert_eq!(get("maxresults").as_deref(), Some("10"));
    assert_eq!(get("key").as_deref(), Some("test-ocm-key"));

    Json(json!([
        { "ID": 7, "AddressInfo": { "Title": "MG Road <Fast> Charger", "Latitude": 12.975, "Longitude": 77.606 } }
    ]))
}

async fn spawn(app: Router) -> SocketAddr {
    let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
        .serve(app.into_make_service());
    let addr = server.local_addr();

    tokio::spawn(server);

    addr
}

async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/v2/directions/:profile/geojson", post(directions))
        .route("/v3/poi/", get(stations));

    spawn(app).await
}

fn config(upstream: SocketAddr, ors_key: &str) -> Config {
    let model_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("models/route_prediction_model.json")
        .display()
        .to_string();
    let ors_base = format!("http://{}", upstream);
    let ors_key = ors_key.to_string();

    Config::from_lookup(move |name| match name {
        "ORS_API_KEY" => Some(ors_key.clone()),
        "OPEN_CHARGE_MAP_API_KEY" => Some("test-ocm-key".into()),
        "ORS_API_BASE" | "OPEN_CHARGE_MAP_API_BASE" => Some(ors_base.clone()),
        "MODEL_PATH" => Some(model_path.clone()),
        "HTTP_TIMEOUT_SECS" => Some("5".into()),
        _ => None,
    })
    .unwrap()
}

async fn spawn_app(ors_key: &str) -> SocketAddr {
    let upstream = spawn_upstream().await;
    let engine = Engine::from_config(&config(upstream, ors_key)).unwrap();

    spawn(router(Arc::new(engine) as DynAPI)).await
}

fn form() -> [(&'static str, &'static str); 4] {
    [
        ("origin", "12.9716,77.5946"),
        ("destination", "13.0827,80.2707"),
        ("traffic_condition", "2"),
        ("battery_level", "80"),
    ]
}

#[tokio::test]
async fn index_shows_form_with_defaults() {
    let app = spawn_app(ORS_KEY).await;

    let res = reqwest::get(format!("http://{}/", app)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.text().await.unwrap();
    assert!(body.contains("value=\"12.9716,77.5946\""));
    assert!(body.contains("value=\"13.0827,80.2707\""));
    assert!(body.contains("<option value=\"1\" selected>Light</option>"));
    assert!(body.contains("Predict Best Route"));
}

#[tokio::test]
async fn form_submission_renders_map_and_estimate() {
    let app = spawn_app(ORS_KEY).await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/predict", app))
        .form(&form())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.text().await.unwrap();
    assert!(body.contains("L.polyline(view.polyline.points"));
    assert!(body.contains("[[12.8,77.5946],[13.0827,80.2707]]"));
    assert!(body.contains("MG Road \\u003cFast\\u003e Charger"));
    assert!(body.contains("Estimated Travel Time: "));
    assert!(!body.contains("class=\"error\""));
}

#[tokio::test]
async fn rejected_route_request_is_reported_inline() {
    let app = spawn_app("revoked-key").await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/predict", app))
        .form(&form())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.text().await.unwrap();
    assert!(body.contains("⚠️ Route Fetching Failed: 403"));
    assert!(!body.contains("Estimated Travel Time"));
}

#[tokio::test]
async fn bad_form_input_is_reported_inline() {
    let app = spawn_app(ORS_KEY).await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/predict", app))
        .form(&[
            ("origin", "12.9716"),
            ("destination", "13.0827,80.2707"),
            ("traffic_condition", "2"),
            ("battery_level", "80"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.text().await.unwrap();
    assert!(body.contains("⚠️ Invalid Input: "));
    assert!(body.contains("value=\"12.9716\""));
}

#[tokio::test]
async fn json_api_returns_plan() {
    let app = spawn_app(ORS_KEY).await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/api/predictions", app))
        .json(&json!({
            "origin": "12.9716,77.5946",
            "destination": "13.0827,80.2707",
            "traffic_condition": 2,
            "battery_level": 80
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let plan: Value = res.json().await.unwrap();
    assert_eq!(plan["route"]["points"][0], json!({ "lat": 12.9716, "lon": 77.5946 }));
    assert_eq!(plan["stations"][0]["name"], json!("MG Road <Fast> Charger"));
    assert_eq!(plan["query"]["traffic_condition"], json!(2));
    assert_eq!(plan["query"]["battery_level"], json!(80));

    let minutes = plan["result"]["minutes"].as_f64().unwrap();
    assert_eq!(
        plan["message"],
        json!(format!("Estimated Travel Time: {:.2} minutes", minutes))
    );
}

#[tokio::test]
async fn json_api_maps_errors_to_status() {
    let app = spawn_app("revoked-key").await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/api/predictions", app))
        .json(&json!({
            "origin": "12.9716,77.5946",
            "destination": "13.0827,80.2707",
            "traffic_condition": 2,
            "battery_level": 80
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], json!("route_api"));
    assert_eq!(body["stage"], json!("fetching_route"));

    let res = reqwest::Client::new()
        .post(format!("http://{}/api/predictions", app))
        .json(&json!({
            "origin": "12.9716,77.5946",
            "destination": "13.0827,80.2707",
            "traffic_condition": 5,
            "battery_level": 80
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn json_api_rejects_mistyped_fields_with_error_body() {
    let app = spawn_app(ORS_KEY).await;

    for body in [
        json!({
            "origin": "12.9716,77.5946",
            "destination": "13.0827,80.2707",
            "traffic_condition": "2",
            "battery_level": 80
        }),
        json!({
            "origin": "12.9716,77.5946",
            "destination": "13.0827,80.2707",
            "traffic_condition": 2
        }),
    ] {
        let res = reqwest::Client::new()
            .post(format!("http://{}/api/predictions", app))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let error: Value = res.json().await.unwrap();
        assert_eq!(error["kind"], json!("invalid_input"));
        assert_eq!(error["code"], json!(101));
        assert!(error["error"].as_str().unwrap().starts_with("Invalid Input: "));
    }
}

#[tokio::test]
async fn health() {
    let app = spawn_app(ORS_KEY).await;

    let body = reqwest::get(format!("http://{}/health", app))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(body, "ok");
}

#[test]
fn missing_model_aborts_startup() {
    let config = Config::from_lookup(|name| match name {
        "ORS_API_KEY" => Some("key".into()),
        "OPEN_CHARGE_MAP_API_KEY" => Some("key".into()),
        "MODEL_PATH" => Some("no/such/model.json".into()),
        _ => None,
    })
    .unwrap();

    let err = match Engine::from_config(&config) {
        Ok(_) => panic!("engine built without a model"),
        Err(err) => err,
    };

    assert_eq!(err.kind, ErrorKind::ModelUnavailable);
    assert!(err.is_startup_fatal());
}
