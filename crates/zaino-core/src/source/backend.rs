//! Client for the non-flow dashboard endpoints
//!
//! The home view shows a visit counter and a weather card next to the flow
//! gauge. Both are fetched once per page view rather than polled.

use crate::source::http::join_url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors from the visit and weather endpoints
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("backend error: {0}")]
    Upstream(String),

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid station id: {0}")]
    InvalidStation(String),
}

/// Kind of weather station, derived from the id format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StationKind {
    /// Airport METAR station (4-letter ICAO code)
    Metar,
    /// Personal weather device (`d` followed by digits)
    Device,
}

/// Validated weather station id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationId {
    id: String,
    kind: StationKind,
}

impl StationId {
    /// Validate a station id
    ///
    /// Four ASCII letters are a METAR code; `d` followed by at least ten
    /// digits is a device.
    pub fn parse(id: &str) -> Result<Self, BackendError> {
        let kind = if id.len() == 4 && id.chars().all(|c| c.is_ascii_alphabetic()) {
            StationKind::Metar
        } else if id.len() >= 11
            && id.starts_with('d')
            && id[1..].chars().all(|c| c.is_ascii_digit())
        {
            StationKind::Device
        } else {
            return Err(BackendError::InvalidStation(id.to_string()));
        };

        Ok(Self {
            id: id.to_string(),
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> StationKind {
        self.kind
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct VisitsResponse {
    num_visitas: u64,
}

/// Values derived by the backend from the raw station data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComputedWeather {
    /// Estimated cloud base height (m)
    #[serde(rename = "cloudsHeight", default)]
    pub clouds_height: Option<f64>,
}

/// Current conditions reported by a weather station
///
/// Only the fields shown on the dashboard are typed; everything else is
/// kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Temperature (°C)
    #[serde(default)]
    pub temp: Option<f64>,
    /// Relative humidity (%)
    #[serde(default)]
    pub hum: Option<f64>,
    /// Wind speed (m/s)
    #[serde(default)]
    pub wspd: Option<f64>,
    /// Wind direction (degrees)
    #[serde(default)]
    pub wdir: Option<f64>,
    /// Barometric pressure (hPa)
    #[serde(default)]
    pub bar: Option<f64>,
    /// Rain (mm)
    #[serde(default)]
    pub rain: Option<f64>,
    #[serde(default)]
    pub computed: Option<ComputedWeather>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// HTTP client for `/api/visitas` and `/api/weather/<id>`
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build HTTP client, using defaults");
            reqwest::Client::new()
        });

        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Count a visit and return the new total
    pub async fn register_visit(&self) -> Result<u64, BackendError> {
        let response = self
            .client
            .post(join_url(&self.base_url, "/api/visitas"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let body = response.text().await?;
        let visits: VisitsResponse = serde_json::from_str(&body)?;
        tracing::debug!(visits = visits.num_visitas, "Visit registered");
        Ok(visits.num_visitas)
    }

    /// Current conditions for a station
    pub async fn weather(&self, station: &StationId) -> Result<WeatherReport, BackendError> {
        let path = format!("/api/weather/{}", station.as_str());
        let response = self
            .client
            .get(join_url(&self.base_url, &path))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let body = response.text().await?;
        parse_weather(&body)
    }
}

/// Decode a weather body, turning `{"error": ...}` into [`BackendError::Upstream`]
pub fn parse_weather(body: &str) -> Result<WeatherReport, BackendError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if let Some(message) = value.get("error") {
        let message = message
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| message.to_string());
        return Err(BackendError::Upstream(message));
    }
    Ok(serde_json::from_value(value)?)
}
