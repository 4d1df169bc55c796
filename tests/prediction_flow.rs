use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_test::block_on;

use evroute::api::{PredictionAPI, PredictionInput};
use evroute::engine::{Engine, MAX_STATIONS};
use evroute::entities::{
    ChargingStation, Coordinates, PredictionFeatures, Profile, RouteGeometry, Stage,
};
use evroute::error::{route_api_error, upstream_error, Error, ErrorKind};
use evroute::external::open_charge_map::parse_stations;
use evroute::external::{RouteProvider, StationProvider};
use evroute::map::LeafletRenderer;
use evroute::predictor::Predictor;

const MODEL: &str = r#"{
    "feature_names": ["origin_lat", "origin_lon", "dest_lat", "dest_lon", "traffic_condition", "battery_level"],
    "trees": [
        { "nodes": [
            { "feature": 4, "threshold": 1.5, "left": 1, "right": 2 },
            { "value": 60.0 },
            { "value": 40.0 }
        ] },
        { "nodes": [
            { "feature": 5, "threshold": 85.0, "left": 1, "right": 2 },
            { "value": 43.5 },
            { "value": 35.0 }
        ] }
    ]
}"#;

struct FakeRoutes {
    response: Result<Vec<Vec<f64>>, Error>,
    calls: Mutex<Vec<(Coordinates, Coordinates, Profile)>>,
}

impl FakeRoutes {
    fn new(response: Result<Vec<Vec<f64>>, Error>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: Mutex::new(vec![]),
        })
    }
}

#[async_trait]
impl RouteProvider for FakeRoutes {
    async fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteGeometry, Error> {
        self.calls.lock().unwrap().push((origin, destination, profile));

        let pairs = self.response.clone()?;
        RouteGeometry::from_lon_lat_pairs(&pairs)
    }
}

struct FakeStations {
    response: Result<Vec<ChargingStation>, Error>,
    calls: Mutex<Vec<(Coordinates, usize)>>,
}

impl FakeStations {
    fn new(response: Result<Vec<ChargingStation>, Error>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: Mutex::new(vec![]),
        })
    }
}

#[async_trait]
impl StationProvider for FakeStations {
    async fn nearby(
        &self,
        location: Coordinates,
        max_results: usize,
    ) -> Result<Vec<ChargingStation>, Error> {
        self.calls.lock().unwrap().push((location, max_results));

        self.response.clone()
    }
}

fn route_pairs() -> Vec<Vec<f64>> {
    vec![
        vec![77.5946, 12.9716],
        vec![78.8, 12.7],
        vec![80.2707, 13.0827],
    ]
}

fn stations() -> Vec<ChargingStation> {
    vec![
        ChargingStation::new("MG Road Charger", Coordinates { lat: 12.975, lon: 77.606 }),
        ChargingStation::new("Indiranagar Hub", Coordinates { lat: 12.978, lon: 77.64 }),
    ]
}

fn engine(routes: Arc<FakeRoutes>, stations: Arc<FakeStations>) -> (Engine, Arc<Predictor>) {
    let predictor = Arc::new(Predictor::from_json(MODEL).unwrap());
    let engine = Engine::new(
        predictor.clone(),
        routes,
        stations,
        Arc::new(LeafletRenderer),
    );

    (engine, predictor)
}

fn input(origin: &str, destination: &str, traffic: i64, battery: i64) -> PredictionInput {
    PredictionInput {
        origin: origin.into(),
        destination: destination.into(),
        traffic_condition: traffic,
        battery_level: battery,
    }
}

#[test]
fn successful_run() {
    let routes = FakeRoutes::new(Ok(route_pairs()));
    let stations = FakeStations::new(Ok(stations()));
    let (engine, predictor) = engine(routes.clone(), stations.clone());

    let plan = block_on(engine.predict_route(input(
        "12.9716,77.5946",
        "13.0827,80.2707",
        2,
        80,
    )))
    .unwrap();

    let expected = predictor
        .estimate(&PredictionFeatures([
            12.9716, 77.5946, 13.0827, 80.2707, 2.0, 80.0,
        ]))
        .unwrap();
    assert_eq!(plan.result.minutes, expected);
    assert_eq!(plan.message, format!("Estimated Travel Time: {:.2} minutes", expected));
    assert_eq!(plan.message, "Estimated Travel Time: 41.75 minutes");

    let points: Vec<[f64; 2]> = plan.route.points.iter().map(|p| p.to_lat_lon()).collect();
    assert_eq!(
        points,
        vec![[12.9716, 77.5946], [12.7, 78.8], [13.0827, 80.2707]]
    );
    assert_eq!(plan.stations.len(), 2);

    assert!(plan.map_html.contains("map.fitBounds(view.fit_bounds)"));
    assert!(plan.map_html.contains("[[12.7,77.5946],[13.0827,80.2707]]"));
    assert!(plan.map_html.contains("MG Road Charger"));

    let route_calls = routes.calls.lock().unwrap();
    assert_eq!(route_calls.len(), 1);
    assert_eq!(route_calls[0].0, Coordinates { lat: 12.9716, lon: 77.5946 });
    assert_eq!(route_calls[0].1, Coordinates { lat: 13.0827, lon: 80.2707 });
    assert_eq!(route_calls[0].2, Profile::DrivingCar);

    let station_calls = stations.calls.lock().unwrap();
    assert_eq!(
        station_calls.as_slice(),
        &[(Coordinates { lat: 12.9716, lon: 77.5946 }, MAX_STATIONS)]
    );
    assert_eq!(MAX_STATIONS, 10);
}

#[test]
fn runs_are_independent() {
    let routes = FakeRoutes::new(Ok(route_pairs()));
    let stations = FakeStations::new(Ok(stations()));
    let (engine, _) = engine(routes, stations);

    let first = block_on(engine.predict_route(input("12.9716,77.5946", "13.0827,80.2707", 2, 80)))
        .unwrap();
    let second = block_on(engine.predict_route(input("12.9716,77.5946", "13.0827,80.2707", 2, 80)))
        .unwrap();

    assert_eq!(first.result, second.result);
    assert_ne!(first.request_id, second.request_id);
}

#[test]
fn malformed_coordinates_stop_before_any_call() {
    let routes = FakeRoutes::new(Ok(route_pairs()));
    let stations = FakeStations::new(Ok(stations()));
    let (engine, _) = engine(routes.clone(), stations.clone());

    for (origin, destination) in [("12.9716", "13.0827,80.2707"), ("12.9716,77.5946", "abc,def")] {
        let err = block_on(engine.predict_route(input(origin, destination, 2, 80))).unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(err.stage, Some(Stage::Parsing));
        assert!(err.user_message().starts_with("Invalid Input: "));
    }

    assert!(routes.calls.lock().unwrap().is_empty());
    assert!(stations.calls.lock().unwrap().is_empty());
}

#[test]
fn out_of_range_traffic_and_battery_are_rejected() {
    let routes = FakeRoutes::new(Ok(route_pairs()));
    let stations = FakeStations::new(Ok(stations()));
    let (engine, _) = engine(routes.clone(), stations);

    for (traffic, battery) in [(0, 80), (4, 80), (2, -5), (2, 101)] {
        let err = block_on(engine.predict_route(input(
            "12.9716,77.5946",
            "13.0827,80.2707",
            traffic,
            battery,
        )))
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    assert!(routes.calls.lock().unwrap().is_empty());
}

#[test]
fn route_api_error_is_distinguished() {
    let routes = FakeRoutes::new(Err(route_api_error(
        "403 ({\"error\": \"Access to this API has been disallowed\"})",
    )));
    let stations = FakeStations::new(Ok(stations()));
    let (engine, _) = engine(routes, stations.clone());

    let err = block_on(engine.predict_route(input("12.9716,77.5946", "13.0827,80.2707", 2, 80)))
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::RouteApi);
    assert_eq!(err.stage, Some(Stage::FetchingRoute));
    assert!(err.user_message().starts_with("Route Fetching Failed: 403"));
    assert!(stations.calls.lock().unwrap().is_empty());
}

#[test]
fn network_failure_while_routing_is_generic() {
    let routes = FakeRoutes::new(Err(upstream_error("error sending request")));
    let stations = FakeStations::new(Ok(stations()));
    let (engine, _) = engine(routes, stations);

    let err = block_on(engine.predict_route(input("12.9716,77.5946", "13.0827,80.2707", 2, 80)))
        .unwrap_err();

    assert_eq!(err.user_message(), "An error occurred: error sending request");
    assert_eq!(err.stage, Some(Stage::FetchingRoute));
}

#[test]
fn empty_route_is_generic_failure() {
    let routes = FakeRoutes::new(Ok(vec![]));
    let stations = FakeStations::new(Ok(stations()));
    let (engine, _) = engine(routes, stations);

    let err = block_on(engine.predict_route(input("12.9716,77.5946", "13.0827,80.2707", 2, 80)))
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unexpected);
    assert!(err.user_message().starts_with("An error occurred: "));
}

#[test]
fn malformed_station_record_is_generic_failure() {
    let malformed = parse_stations(r#"[{ "AddressInfo": { "Title": "Broken" } }]"#);
    assert!(malformed.is_err());

    let routes = FakeRoutes::new(Ok(route_pairs()));
    let stations = FakeStations::new(malformed);
    let (engine, _) = engine(routes, stations);

    let err = block_on(engine.predict_route(input("12.9716,77.5946", "13.0827,80.2707", 2, 80)))
        .unwrap_err();

    assert_eq!(err.stage, Some(Stage::FetchingStations));
    assert!(err.user_message().starts_with("An error occurred: "));
}

#[test]
fn no_stations_still_renders() {
    let routes = FakeRoutes::new(Ok(route_pairs()));
    let stations = FakeStations::new(Ok(vec![]));
    let (engine, _) = engine(routes, stations);

    let plan = block_on(engine.predict_route(input("12.9716,77.5946", "13.0827,80.2707", 3, 90)))
        .unwrap();

    assert!(plan.stations.is_empty());
    assert_eq!(plan.message, "Estimated Travel Time: 37.50 minutes");
}
