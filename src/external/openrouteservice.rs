use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    entities::{Coordinates, Profile, RouteGeometry},
    error::{route_api_error, upstream_error, Error},
    external::RouteProvider,
};

#[derive(Clone, Debug, Serialize)]
struct DirectionsRequest {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Feature {
    pub geometry: LineGeometry,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LineGeometry {
    pub coordinates: Vec<Vec<f64>>,
}

/// OpenRouteService directions client.
#[derive(Clone)]
pub struct OpenRouteService {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl std::fmt::Debug for OpenRouteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouteService")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl OpenRouteService {
    pub fn new(client: reqwest::Client, api_base: String, api_key: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

/// Extracts the first route of a geojson directions response, flipped to
/// (lat, lon).
pub fn parse_directions(body: &str) -> Result<RouteGeometry, Error> {
    let data: FeatureCollection = serde_json::from_str(body)?;

    let feature = data
        .features
        .first()
        .ok_or_else(|| upstream_error("directions response contained no route"))?;

    RouteGeometry::from_lon_lat_pairs(&feature.geometry.coordinates)
}

#[async_trait]
impl RouteProvider for OpenRouteService {
    #[tracing::instrument(skip(self))]
    async fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        profile: Profile,
    ) -> Result<RouteGeometry, Error> {
        let url = format!("{}/v2/directions/{}/geojson", self.api_base, profile.name());

        // ORS takes [lon, lat]
        let body = DirectionsRequest {
            coordinates: vec![origin.to_lon_lat(), destination.to_lon_lat()],
        };

        let res = self
            .client
            .post(url)
            .header("Authorization", &self.api_key)
            .header("Accept", "application/geo+json, application/json")
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if status.is_client_error() || status.is_server_error() {
            tracing::warn!(status = status.as_u16(), "directions request rejected");
            return Err(route_api_error(format!("{} ({})", status.as_u16(), text.trim())));
        }

        let geometry = parse_directions(&text)?;

        tracing::info!(points = geometry.len(), "fetched route");

        Ok(geometry)
    }
}

#[test]
fn parse_directions_flips_coordinates() {
    let body = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "summary": { "distance": 346000.1, "duration": 18000.0 } },
            "geometry": {
                "type": "LineString",
                "coordinates": [[77.5946, 12.9716], [79.1, 12.9], [80.2707, 13.0827]]
            }
        }]
    }"#;

    let geometry = parse_directions(body).unwrap();
    let points: Vec<[f64; 2]> = geometry.points.iter().map(|p| p.to_lat_lon()).collect();

    assert_eq!(
        points,
        vec![[12.9716, 77.5946], [12.9, 79.1], [13.0827, 80.2707]]
    );
}

#[test]
fn parse_directions_without_features_fails() {
    use crate::error::ErrorKind;

    let err = parse_directions(r#"{ "features": [] }"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Upstream);

    let err = parse_directions(r#"{ "error": "nope" }"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unexpected);
}
