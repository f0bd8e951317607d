//! Sample sources and backend clients
//!
//! - [`SampleSource`]: anything that can produce one flow sample per poll
//! - [`http::HttpFlowSource`]: the dashboard's flow-meter endpoint
//! - [`payload`]: typed schema for the flow-meter response
//! - [`backend`]: visit counter and weather endpoints

pub mod backend;
pub mod http;
pub mod payload;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Why a single fetch did not produce a sample
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The backend asked us to slow down (HTTP 429)
    #[error("rate limited by backend")]
    Throttled,

    /// Transport failure, timeout or unexpected HTTP status
    #[error("network error: {0}")]
    Network(String),

    /// The response could not be turned into a sample
    #[error("invalid payload: {0}")]
    Parse(String),
}

/// Producer of flow samples (L/min), polled once per tick
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Fetch the latest sample
    async fn fetch_sample(&self) -> Result<f64, FetchError>;
}

#[async_trait]
impl<T: SampleSource + ?Sized> SampleSource for Arc<T> {
    async fn fetch_sample(&self) -> Result<f64, FetchError> {
        (**self).fetch_sample().await
    }
}
