//! Zaino Core - flow sampling, statistics and dashboard backend clients
//!
//! This library provides the client-side core of the Zaino Web flow monitor:
//! a rolling buffer of flow-meter samples fed by a non-overlapping poll of
//! the dashboard backend, with cached fallback when the backend is throttled
//! or unreachable, plus the min/max/average figures the gauge and chart show.

pub mod chart;
pub mod config;
pub mod source;
pub mod stats;
pub mod stream;

pub use config::MonitorConfig;
pub use source::{http::HttpFlowSource, FetchError, SampleSource};
pub use stats::buffer::{FlowStats, SampleBuffer};
pub use stream::sample_stream::{FlowSummary, PollOutcome, SampleStream, StreamError};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Flow rate unit used throughout
pub const FLOW_UNIT: &str = "L/min";
