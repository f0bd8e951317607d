//! Flow-meter response schema
//!
//! The backend answers `GET /api/arduino/flowmeter` with
//!
//! ```json
//! { "success": true, "data": { "constflow": { "value": 12.5 }, "instflow": { "value": 3.1 } } }
//! ```
//!
//! Which reading feeds the stream is configurable: the two sensor fields
//! were swapped once already and the wiring cannot be verified from here.

use crate::source::FetchError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sensor field used when none is configured
pub const DEFAULT_FLOW_FIELD: &str = "constflow";

/// What to do when the configured reading has no `value`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValue {
    /// Report 0 L/min (what the dashboard has always shown)
    #[default]
    Zero,
    /// Treat the response as unparsable
    Reject,
}

/// Top-level flow-meter response
#[derive(Debug, Clone, Deserialize)]
pub struct FlowmeterResponse {
    pub success: bool,
    /// Sensor readings keyed by field name; other keys are ignored
    #[serde(default)]
    pub data: Option<HashMap<String, serde_json::Value>>,
}

/// One sensor reading inside `data`
#[derive(Debug, Clone, Deserialize)]
pub struct SensorReading {
    #[serde(default)]
    pub value: Option<f64>,
}

/// Maps a flow-meter response to a single sample
#[derive(Debug, Clone, PartialEq)]
pub struct FlowExtractor {
    field: String,
    missing: MissingValue,
}

impl FlowExtractor {
    pub fn new(field: impl Into<String>, missing: MissingValue) -> Self {
        Self {
            field: field.into(),
            missing,
        }
    }

    /// Name of the sensor field read from `data`
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn missing_value(&self) -> MissingValue {
        self.missing
    }

    /// Decode a raw response body
    pub fn parse(&self, body: &str) -> Result<f64, FetchError> {
        let response: FlowmeterResponse =
            serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
        self.extract(&response)
    }

    /// Pull the configured reading out of a decoded response
    pub fn extract(&self, response: &FlowmeterResponse) -> Result<f64, FetchError> {
        if !response.success {
            return Err(FetchError::Parse("backend reported success=false".into()));
        }

        let data = response
            .data
            .as_ref()
            .ok_or_else(|| FetchError::Parse("response has no data object".into()))?;

        let value = match data.get(&self.field) {
            Some(raw) if !raw.is_null() => {
                let reading: SensorReading = serde_json::from_value(raw.clone()).map_err(|e| {
                    FetchError::Parse(format!("field '{}' is malformed: {}", self.field, e))
                })?;
                reading.value
            }
            _ => None,
        };

        match (value, self.missing) {
            (Some(v), _) => Ok(v),
            (None, MissingValue::Zero) => Ok(0.0),
            (None, MissingValue::Reject) => Err(FetchError::Parse(format!(
                "field '{}' has no value",
                self.field
            ))),
        }
    }
}

impl Default for FlowExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_FLOW_FIELD, MissingValue::default())
    }
}
