//! Flow-meter source backed by the dashboard's HTTP API

use crate::source::payload::FlowExtractor;
use crate::source::{FetchError, SampleSource};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Path of the flow-meter endpoint relative to the backend base URL
pub const FLOWMETER_PATH: &str = "/api/arduino/flowmeter";

/// Polls `GET <base_url>/api/arduino/flowmeter`
pub struct HttpFlowSource {
    client: reqwest::Client,
    url: String,
    extractor: FlowExtractor,
}

impl HttpFlowSource {
    /// Create a source for `base_url`
    ///
    /// `timeout` bounds each request; `None` leaves reqwest's defaults in place.
    pub fn new(base_url: &str, extractor: FlowExtractor, timeout: Option<Duration>) -> Self {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            "zaino-monitor/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build HTTP client, using defaults");
            reqwest::Client::new()
        });

        Self {
            client,
            url: join_url(base_url, FLOWMETER_PATH),
            extractor,
        }
    }

    /// Full endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SampleSource for HttpFlowSource {
    async fn fetch_sample(&self) -> Result<f64, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Throttled);
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!("unexpected status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        self.extractor.parse(&body)
    }
}

/// Join a base URL and an absolute path without doubling the slash
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
