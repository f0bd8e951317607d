//! Zaino Monitor - flow-meter dashboard client
//!
//! This library re-exports the flow sampling, statistics and backend
//! client functionality from `zaino-core`.
//!
//! The binary in `main.rs` drives a [`SampleStream`] against the dashboard
//! backend and prints the rolling summary to the terminal.

pub use zaino_core::chart;
pub use zaino_core::config;
pub use zaino_core::source;
pub use zaino_core::stats;
pub use zaino_core::stream;

pub use zaino_core::{FetchError, FlowStats, FlowSummary, PollOutcome, SampleBuffer, StreamError};
pub use zaino_core::{HttpFlowSource, MonitorConfig, SampleSource, SampleStream};
pub use zaino_core::{FLOW_UNIT, VERSION};
