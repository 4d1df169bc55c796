use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{config_error, Error};

pub const DEFAULT_MODEL_PATH: &str = "models/route_prediction_model.json";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_ORS_API_BASE: &str = "https://api.openrouteservice.org";
pub const DEFAULT_OPEN_CHARGE_MAP_API_BASE: &str = "https://api.openchargemap.io";

#[derive(Clone)]
pub struct Config {
    pub ors_api_key: String,
    pub open_charge_map_api_key: String,
    pub ors_api_base: String,
    pub open_charge_map_api_base: String,
    pub model_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub http_timeout: Option<Duration>,
}

// keys stay out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("ors_api_base", &self.ors_api_base)
            .field("open_charge_map_api_base", &self.open_charge_map_api_base)
            .field("model_path", &self.model_path)
            .field("bind_addr", &self.bind_addr)
            .field("http_timeout", &self.http_timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up
    /// a local `.env` file.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let required = |name: &str| {
            value(name).ok_or_else(|| config_error(format!("{} must be set", name)))
        };

        let bind_addr = value("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.into())
            .parse::<SocketAddr>()
            .map_err(|err| config_error(format!("BIND_ADDR is not a socket address: {}", err)))?;

        let http_timeout = match value("HTTP_TIMEOUT_SECS") {
            Some(secs) => {
                let secs = secs.parse::<u64>().map_err(|err| {
                    config_error(format!("HTTP_TIMEOUT_SECS is not a number: {}", err))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            ors_api_key: required("ORS_API_KEY")?,
            open_charge_map_api_key: required("OPEN_CHARGE_MAP_API_KEY")?,
            ors_api_base: value("ORS_API_BASE").unwrap_or_else(|| DEFAULT_ORS_API_BASE.into()),
            open_charge_map_api_base: value("OPEN_CHARGE_MAP_API_BASE")
                .unwrap_or_else(|| DEFAULT_OPEN_CHARGE_MAP_API_BASE.into()),
            model_path: value("MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.into())
                .into(),
            bind_addr,
            http_timeout,
        })
    }
}

#[cfg(test)]
fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }
}

#[test]
fn defaults_apply() {
    let config = Config::from_lookup(lookup_from(&[
        ("ORS_API_KEY", "ors-key"),
        ("OPEN_CHARGE_MAP_API_KEY", "ocm-key"),
    ]))
    .unwrap();

    assert_eq!(config.ors_api_key, "ors-key");
    assert_eq!(config.open_charge_map_api_key, "ocm-key");
    assert_eq!(config.ors_api_base, DEFAULT_ORS_API_BASE);
    assert_eq!(config.open_charge_map_api_base, DEFAULT_OPEN_CHARGE_MAP_API_BASE);
    assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
    assert_eq!(config.http_timeout, None);
}

#[test]
fn api_keys_are_required() {
    use crate::error::ErrorKind;

    let err = Config::from_lookup(lookup_from(&[("OPEN_CHARGE_MAP_API_KEY", "ocm-key")]))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Config);
    assert!(err.message.contains("ORS_API_KEY"));

    let err = Config::from_lookup(lookup_from(&[
        ("ORS_API_KEY", "ors-key"),
        ("OPEN_CHARGE_MAP_API_KEY", "  "),
    ]))
    .unwrap_err();
    assert!(err.message.contains("OPEN_CHARGE_MAP_API_KEY"));
}

#[test]
fn overrides_are_read() {
    let config = Config::from_lookup(lookup_from(&[
        ("ORS_API_KEY", "ors-key"),
        ("OPEN_CHARGE_MAP_API_KEY", "ocm-key"),
        ("MODEL_PATH", "/srv/model.json"),
        ("BIND_ADDR", "0.0.0.0:8080"),
        ("HTTP_TIMEOUT_SECS", "15"),
        ("ORS_API_BASE", "http://localhost:8082/ors"),
    ]))
    .unwrap();

    assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
    assert_eq!(config.bind_addr.port(), 8080);
    assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
    assert_eq!(config.ors_api_base, "http://localhost:8082/ors");
}

#[test]
fn invalid_values_are_rejected() {
    assert!(Config::from_lookup(lookup_from(&[
        ("ORS_API_KEY", "ors-key"),
        ("OPEN_CHARGE_MAP_API_KEY", "ocm-key"),
        ("BIND_ADDR", "not an address"),
    ]))
    .is_err());

    assert!(Config::from_lookup(lookup_from(&[
        ("ORS_API_KEY", "ors-key"),
        ("OPEN_CHARGE_MAP_API_KEY", "ocm-key"),
        ("HTTP_TIMEOUT_SECS", "soon"),
    ]))
    .is_err());
}

#[test]
fn values_are_trimmed() {
    let config = Config::from_lookup(lookup_from(&[
        ("ORS_API_KEY", "  ors-key \n"),
        ("OPEN_CHARGE_MAP_API_KEY", "\tocm-key"),
        ("MODEL_PATH", " /srv/model.json "),
        ("BIND_ADDR", " 0.0.0.0:8080"),
        ("HTTP_TIMEOUT_SECS", "15 "),
    ]))
    .unwrap();

    assert_eq!(config.ors_api_key, "ors-key");
    assert_eq!(config.open_charge_map_api_key, "ocm-key");
    assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
    assert_eq!(config.bind_addr.port(), 8080);
    assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
}
