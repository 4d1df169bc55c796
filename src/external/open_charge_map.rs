use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    entities::{ChargingStation, Coordinates},
    error::{upstream_error, Error},
    external::StationProvider,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PointOfInterest {
    address_info: AddressInfo,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddressInfo {
    title: String,
    latitude: f64,
    longitude: f64,
}

/// Open Charge Map point-of-interest client.
#[derive(Clone)]
pub struct OpenChargeMap {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl std::fmt::Debug for OpenChargeMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenChargeMap")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl OpenChargeMap {
    pub fn new(client: reqwest::Client, api_base: String, api_key: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

/// Every record must carry `AddressInfo.Title`, `Latitude` and `Longitude`;
/// one malformed record fails the whole response.
pub fn parse_stations(body: &str) -> Result<Vec<ChargingStation>, Error> {
    let records: Vec<PointOfInterest> = serde_json::from_str(body)?;

    Ok(records
        .into_iter()
        .map(|poi| {
            let info = poi.address_info;
            ChargingStation::new(
                info.title,
                Coordinates {
                    lat: info.latitude,
                    lon: info.longitude,
                },
            )
        })
        .collect())
}

#[async_trait]
impl StationProvider for OpenChargeMap {
    #[tracing::instrument(skip(self))]
    async fn nearby(
        &self,
        location: Coordinates,
        max_results: usize,
    ) -> Result<Vec<ChargingStation>, Error> {
        let url = format!("{}/v3/poi/", self.api_base);

        let res = self
            .client
            .get(url)
            .query(&[("output", "json")])
            .query(&[("latitude", location.lat)])
            .query(&[("longitude", location.lon)])
            .query(&[("maxresults", max_results)])
            .query(&[("key", &self.api_key)])
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            return Err(upstream_error(format!(
                "charging station lookup failed with {} ({})",
                status.as_u16(),
                text.trim()
            )));
        }

        let stations = parse_stations(&text)?;

        tracing::info!(count = stations.len(), "fetched charging stations");

        Ok(stations)
    }
}

#[test]
fn parse_station_records() {
    let body = r#"[
        { "ID": 1, "AddressInfo": { "Title": "MG Road Charger", "Latitude": 12.975, "Longitude": 77.606, "Town": "Bengaluru" } },
        { "ID": 2, "AddressInfo": { "Title": "Airport Plaza", "Latitude": 13.198, "Longitude": 77.706 } }
    ]"#;

    let stations = parse_stations(body).unwrap();

    assert_eq!(
        stations,
        vec![
            ChargingStation::new("MG Road Charger", Coordinates { lat: 12.975, lon: 77.606 }),
            ChargingStation::new("Airport Plaza", Coordinates { lat: 13.198, lon: 77.706 }),
        ]
    );
}

#[test]
fn malformed_station_record_is_a_generic_error() {
    use crate::error::ErrorKind;

    let body = r#"[{ "AddressInfo": { "Title": "No coordinates" } }]"#;
    let err = parse_stations(body).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unexpected);
    assert!(err.user_message().starts_with("An error occurred: "));

    let err = parse_stations(r#"[{ "ID": 3 }]"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unexpected);
}

#[test]
fn empty_station_list() {
    assert!(parse_stations("[]").unwrap().is_empty());
}

#[test]
fn failed_request_does_not_expose_api_key() {
    use crate::external::http_client;
    use tokio_test::block_on;

    let stations = OpenChargeMap::new(
        http_client(None).unwrap(),
        "http://127.0.0.1:1".into(),
        "SECRET-OCM-KEY".into(),
    );

    let err = block_on(stations.nearby(Coordinates { lat: 12.9716, lon: 77.5946 }, 10)).unwrap_err();

    assert!(err.user_message().starts_with("An error occurred: "));
    assert!(!err.user_message().contains("SECRET-OCM-KEY"));
    assert!(!err.message.contains("key="));
}
